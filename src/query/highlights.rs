use anyhow::Result;
use rusqlite::{params, OptionalExtension};

use crate::query::filters::sql_limit;
use crate::query::{
    CloseContestAnswer, EducationWinRateAnswer, SeatChangeAnswer, TurnoutAnswer,
    VoteShareTrendAnswer, WomenParticipationAnswer,
};
use crate::store::ElectionStore;

/// Education categories with fewer candidates than this are left out of win rates.
pub const MIN_EDUCATION_SAMPLE: i64 = 50;
pub const EDUCATION_TOP_N: i64 = 10;

impl ElectionStore {
    /// State with the highest turnout in the most recent year.
    pub fn highest_turnout(&self) -> Result<Option<TurnoutAnswer>> {
        let answer = self
            .conn()
            .query_row(
                r#"
SELECT state_name, turnout_pct, year
FROM state_turnout
WHERE year = (SELECT MAX(year) FROM state_turnout)
ORDER BY turnout_pct DESC, state_name ASC
LIMIT 1
"#,
                [],
                |row| {
                    Ok(TurnoutAnswer {
                        state_name: row.get(0)?,
                        turnout_pct: row.get(1)?,
                        year: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(answer)
    }

    /// Party-year with the largest absolute seat swing.
    pub fn biggest_seat_change(&self) -> Result<Option<SeatChangeAnswer>> {
        let answer = self
            .conn()
            .query_row(
                r#"
SELECT party, year, seat_change
FROM party_year_delta
ORDER BY ABS(seat_change) DESC, year ASC, party ASC
LIMIT 1
"#,
                [],
                |row| {
                    Ok(SeatChangeAnswer {
                        party: row.get(0)?,
                        year: row.get(1)?,
                        seat_change: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(answer)
    }

    /// Share of all candidacies tagged female; `None` for an empty dataset.
    pub fn women_participation(&self) -> Result<Option<WomenParticipationAnswer>> {
        let (total, female): (i64, i64) = self.conn().query_row(
            r#"
SELECT COUNT(*), COALESCE(SUM(CASE WHEN gender = 'F' THEN 1 ELSE 0 END), 0)
FROM candidates
"#,
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        if total == 0 {
            return Ok(None);
        }
        Ok(Some(WomenParticipationAnswer {
            percentage: female as f64 * 100.0 / total as f64,
        }))
    }

    pub fn closest_margins(&self, limit: usize) -> Result<Vec<CloseContestAnswer>> {
        let mut stmt = self.conn().prepare(
            r#"
SELECT constituency_name, state_name, year, margin
FROM victory_margins
WHERE margin > 0
ORDER BY margin ASC, year ASC, state_name ASC, constituency_name ASC
LIMIT ?1
"#,
        )?;
        let rows = stmt
            .query_map(params![sql_limit(limit)], |row| {
                Ok(CloseContestAnswer {
                    constituency_name: row.get(0)?,
                    state_name: row.get(1)?,
                    year: row.get(2)?,
                    margin: row.get(3)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// National / Regional / Other share of each year's votes.
    pub fn vote_share_trend(&self) -> Result<Vec<VoteShareTrendAnswer>> {
        let mut stmt = self.conn().prepare(
            r#"
WITH classified AS (
    SELECT year, party_category AS category, TOTAL(votes) AS votes
    FROM candidates
    GROUP BY year, party_category
),
totals AS (
    SELECT year, TOTAL(votes) AS total_votes
    FROM classified
    GROUP BY year
)
SELECT c.category,
       c.year,
       CASE WHEN t.total_votes = 0 THEN 0.0
            ELSE c.votes * 100.0 / t.total_votes
       END AS vote_pct
FROM classified c
JOIN totals t ON c.year = t.year
ORDER BY c.year ASC, c.category ASC
"#,
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(VoteShareTrendAnswer {
                    category: row.get(0)?,
                    year: row.get(1)?,
                    vote_pct: row.get(2)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn education_win_rate(&self) -> Result<Vec<EducationWinRateAnswer>> {
        let mut stmt = self.conn().prepare(
            r#"
SELECT education, SUM(is_winner) * 100.0 / COUNT(*) AS win_rate
FROM candidates
GROUP BY education
HAVING COUNT(*) >= ?1
ORDER BY win_rate DESC, education ASC
LIMIT ?2
"#,
        )?;
        let rows = stmt
            .query_map(params![MIN_EDUCATION_SAMPLE, EDUCATION_TOP_N], |row| {
                Ok(EducationWinRateAnswer {
                    education: row.get(0)?,
                    win_rate: row.get(1)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}
