use anyhow::Result;
use rusqlite::params_from_iter;
use rusqlite::types::Value;

use crate::query::filters::{like_pattern, sql_limit, FilterColumns, SqlFilter};
use crate::query::{
    CandidateLookup, FilterOptions, GenderRepresentation, MarginRecord, PartySeatShare,
    QueryFilters, StateTurnout, VoteShare,
};
use crate::store::ElectionStore;

impl ElectionStore {
    /// Distinct values available to every filter, each sorted ascending.
    pub fn filter_options(&self) -> Result<FilterOptions> {
        Ok(FilterOptions {
            years: self.distinct("year")?,
            states: self.distinct("state_name")?,
            parties: self.distinct("party")?,
            genders: self.distinct("gender")?,
            constituencies: self.distinct("constituency_name")?,
        })
    }

    fn distinct<T: rusqlite::types::FromSql>(&self, column: &str) -> Result<Vec<T>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT DISTINCT {column} FROM candidates WHERE {column} IS NOT NULL ORDER BY {column}"
        ))?;
        let values = stmt
            .query_map([], |row| row.get::<_, T>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(values)
    }

    pub fn party_seat_share(&self, filters: &QueryFilters) -> Result<Vec<PartySeatShare>> {
        let mut sql = SqlFilter::from_filters(filters, &FilterColumns::ALL);
        sql.fixed("is_winner = 1");
        let query = format!(
            r#"
SELECT year, party, state_name, COUNT(*) AS seats
FROM candidates{}
GROUP BY year, party, state_name
ORDER BY year ASC, seats DESC, party ASC, state_name ASC
"#,
            sql.where_sql()
        );
        let mut stmt = self.conn().prepare(&query)?;
        let rows = stmt
            .query_map(params_from_iter(sql.values()), |row| {
                Ok(PartySeatShare {
                    year: row.get(0)?,
                    party: row.get(1)?,
                    state_name: row.get(2)?,
                    seats: row.get(3)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn state_turnout(&self, filters: &QueryFilters) -> Result<Vec<StateTurnout>> {
        let sql = SqlFilter::from_filters(filters, &FilterColumns::YEAR_STATE);
        let query = format!(
            r#"
SELECT year, state_name, turnout_pct, electors, valid_votes
FROM state_turnout{}
ORDER BY year ASC, turnout_pct DESC, state_name ASC
"#,
            sql.where_sql()
        );
        let mut stmt = self.conn().prepare(&query)?;
        let rows = stmt
            .query_map(params_from_iter(sql.values()), |row| {
                Ok(StateTurnout {
                    year: row.get(0)?,
                    state_name: row.get(1)?,
                    turnout_pct: row.get(2)?,
                    electors: row.get(3)?,
                    valid_votes: row.get(4)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn gender_representation(&self, year: Option<i64>) -> Result<Vec<GenderRepresentation>> {
        let mut sql = SqlFilter::default();
        if let Some(year) = year {
            sql.eq("year", Value::Integer(year));
        }
        let query = format!(
            r#"
SELECT year, gender, total_candidates, total_winners
FROM gender_representation{}
ORDER BY year ASC, gender ASC
"#,
            sql.where_sql()
        );
        let mut stmt = self.conn().prepare(&query)?;
        let rows = stmt
            .query_map(params_from_iter(sql.values()), |row| {
                Ok(GenderRepresentation {
                    year: row.get(0)?,
                    gender: row.get(1)?,
                    total_candidates: row.get(2)?,
                    total_winners: row.get(3)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Largest parties by votes in `year`; `vote_pct` is relative to every party's votes that year.
    pub fn top_vote_share(&self, year: i64, limit: usize) -> Result<Vec<VoteShare>> {
        let mut stmt = self.conn().prepare(
            r#"
WITH totals AS (
    SELECT TOTAL(total_votes) AS year_total
    FROM party_vote_share
    WHERE year = ?1
)
SELECT p.party,
       p.year,
       p.total_votes,
       CASE WHEN t.year_total IS NULL OR t.year_total = 0
            THEN 0.0
            ELSE p.total_votes * 100.0 / t.year_total
       END AS vote_pct
FROM party_vote_share p, totals t
WHERE p.year = ?1
ORDER BY p.total_votes DESC, p.party ASC
LIMIT ?2
"#,
        )?;
        let rows = stmt
            .query_map(rusqlite::params![year, sql_limit(limit)], |row| {
                Ok(VoteShare {
                    party: row.get(0)?,
                    year: row.get(1)?,
                    total_votes: row.get(2)?,
                    vote_pct: row.get(3)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Winning margins, smallest first; winners without a recorded margin sort last.
    pub fn margin_distribution(&self, filters: &QueryFilters) -> Result<Vec<MarginRecord>> {
        let sql = SqlFilter::from_filters(filters, &FilterColumns::MARGINS);
        let query = format!(
            r#"
SELECT year, state_name, constituency_name, party, margin
FROM victory_margins{}
ORDER BY margin IS NULL, margin ASC, year ASC, state_name ASC, constituency_name ASC
"#,
            sql.where_sql()
        );
        let mut stmt = self.conn().prepare(&query)?;
        let rows = stmt
            .query_map(params_from_iter(sql.values()), |row| {
                Ok(MarginRecord {
                    year: row.get(0)?,
                    state_name: row.get(1)?,
                    constituency_name: row.get(2)?,
                    party: row.get(3)?,
                    margin: row.get(4)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Case-insensitive substring match on candidate or constituency name, newest first.
    pub fn search_candidates(
        &self,
        query: &str,
        filters: &QueryFilters,
        limit: usize,
    ) -> Result<Vec<CandidateLookup>> {
        let mut sql = SqlFilter::default();
        sql.raw(
            "(candidate_name LIKE {} ESCAPE '\\' OR constituency_name LIKE {} ESCAPE '\\')",
            Value::Text(like_pattern(query)),
        );
        sql.apply(filters, &FilterColumns::ALL);
        let limit_placeholder = sql.bind(Value::Integer(sql_limit(limit)));
        let statement = format!(
            r#"
SELECT year, state_name, constituency_name, candidate_name, party, gender, position, votes, margin
FROM candidate_lookup{}
ORDER BY year DESC, state_name ASC, constituency_name ASC, position ASC
LIMIT {limit_placeholder}
"#,
            sql.where_sql()
        );
        let mut stmt = self.conn().prepare(&statement)?;
        let rows = stmt
            .query_map(params_from_iter(sql.values()), |row| {
                Ok(CandidateLookup {
                    year: row.get(0)?,
                    state_name: row.get(1)?,
                    constituency_name: row.get(2)?,
                    candidate_name: row.get(3)?,
                    party: row.get(4)?,
                    gender: row.get(5)?,
                    position: row.get(6)?,
                    votes: row.get(7)?,
                    margin: row.get(8)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use crate::loader::fixtures::record;
    use crate::loader::CandidacyRecord;
    use crate::query::QueryFilters;
    use crate::store::test_support::store_with;

    fn maharashtra_1999() -> Vec<CandidacyRecord> {
        let mut winner = record(1999, "Maharashtra", "Mumbai North", "BJP", 1, 50000);
        winner.candidate_name = Some("Ram Naik".to_string());
        winner.margin = Some(10000);
        let mut runner_up = record(1999, "Maharashtra", "Mumbai North", "INC", 2, 40000);
        runner_up.candidate_name = Some("Sunita Patil".to_string());
        runner_up.gender = "F".to_string();
        vec![winner, runner_up]
    }

    fn multi_year() -> Vec<CandidacyRecord> {
        let mut records = maharashtra_1999();
        records.push(record(1999, "Goa", "Panaji", "INC", 1, 9000));
        records.push(record(1999, "Goa", "Panaji", "BJP", 2, 8000));
        records.push(record(2004, "Goa", "Panaji", "BJP", 1, 9500));
        records.push(record(2004, "Goa", "Panaji", "INC", 2, 9400));
        records.push(record(2004, "Maharashtra", "Mumbai North", "INC", 1, 52000));
        records
    }

    #[test]
    fn unbounded_limit_returns_every_party() {
        let store = store_with(multi_year());
        let rows = store.top_vote_share(1999, usize::MAX).expect("vote share");
        assert_eq!(rows.len(), 2);
        let found = store
            .search_candidates("Panaji", &QueryFilters::default(), usize::MAX)
            .expect("search");
        assert_eq!(found.len(), 4);
    }

    #[test]
    fn huge_vote_totals_still_yield_shares() {
        let store = store_with(vec![
            record(2014, "Goa", "Panaji", "BJP", 1, i64::MAX),
            record(2014, "Goa", "Panaji", "INC", 2, i64::MAX),
            record(2014, "Goa", "Margao", "BJP", 1, i64::MAX),
        ]);
        let rows = store.top_vote_share(2014, 10).expect("vote share");
        let bjp = rows.iter().find(|r| r.party == "BJP").expect("bjp row");
        assert_eq!(bjp.total_votes, i64::MAX);
        assert!((bjp.vote_pct - 50.0).abs() < 1e-6);
    }

    #[test]
    fn maharashtra_example_seat_share_and_margin() {
        let store = store_with(maharashtra_1999());
        let seats = store
            .party_seat_share(&QueryFilters::year(1999).with_state("Maharashtra"))
            .expect("seat share");
        assert_eq!(seats.len(), 1);
        assert_eq!(seats[0].party, "BJP");
        assert_eq!(seats[0].seats, 1);
        assert_eq!(seats[0].state_name.as_deref(), Some("Maharashtra"));

        let margins = store
            .margin_distribution(&QueryFilters::year(1999))
            .expect("margins");
        assert_eq!(margins.len(), 1);
        assert_eq!(margins[0].constituency_name, "Mumbai North");
        assert_eq!(margins[0].margin, Some(10000));
    }

    #[test]
    fn seat_share_filters_are_and_combined() {
        let store = store_with(multi_year());
        let all = store
            .party_seat_share(&QueryFilters::default())
            .expect("all");
        assert_eq!(all.len(), 4);
        assert!(all.windows(2).all(|w| w[0].year <= w[1].year));

        let inc_only = store
            .party_seat_share(&QueryFilters::default().with_party("INC"))
            .expect("inc");
        assert!(inc_only.iter().all(|r| r.party == "INC"));
        assert_eq!(inc_only.len(), 2);

        let none = store
            .party_seat_share(&QueryFilters::year(2004).with_gender("F"))
            .expect("none");
        assert!(none.is_empty());
    }

    #[test]
    fn top_vote_share_percentages_sum_to_hundred() {
        let store = store_with(multi_year());
        let all = store.top_vote_share(1999, 100).expect("vote share");
        let total: f64 = all.iter().map(|r| r.vote_pct).sum();
        assert!((total - 100.0).abs() < 1e-9);
        assert!(all.windows(2).all(|w| w[0].total_votes >= w[1].total_votes));

        let top = store.top_vote_share(1999, 1).expect("top");
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].party, "BJP");
        assert_eq!(top[0].total_votes, 58000);
        assert!((top[0].vote_pct - 58000.0 * 100.0 / 107000.0).abs() < 1e-9);

        assert!(store.top_vote_share(1980, 5).expect("empty").is_empty());
    }

    #[test]
    fn search_matches_names_case_insensitively() {
        let store = store_with(multi_year());
        let hits = store
            .search_candidates("mumbai", &QueryFilters::default(), 20)
            .expect("search");
        assert_eq!(hits.len(), 3);
        assert_eq!(hits[0].year, 2004);

        let by_name = store
            .search_candidates("sunita", &QueryFilters::year(1999), 20)
            .expect("search");
        assert_eq!(by_name.len(), 1);
        assert_eq!(by_name[0].gender.as_deref(), Some("F"));

        let limited = store
            .search_candidates("panaji", &QueryFilters::default().with_party("BJP"), 1)
            .expect("search");
        assert_eq!(limited.len(), 1);
        assert_eq!(limited[0].party, "BJP");

        let literal = store
            .search_candidates("%", &QueryFilters::default(), 20)
            .expect("search");
        assert!(literal.is_empty());
    }

    #[test]
    fn filter_options_are_sorted_and_distinct() {
        let store = store_with(multi_year());
        let options = store.filter_options().expect("options");
        assert_eq!(options.years, vec![1999, 2004]);
        assert_eq!(options.states, vec!["Goa", "Maharashtra"]);
        assert_eq!(options.parties, vec!["BJP", "INC"]);
        assert_eq!(options.genders, vec!["F", "M"]);
        assert_eq!(options.constituencies, vec!["Mumbai North", "Panaji"]);
    }

    #[test]
    fn turnout_and_gender_views_respect_year() {
        let store = store_with(multi_year());
        let turnout = store
            .state_turnout(&QueryFilters::year(2004))
            .expect("turnout");
        assert_eq!(turnout.len(), 2);
        assert!(turnout.iter().all(|t| t.year == 2004));

        let gender = store.gender_representation(Some(1999)).expect("gender");
        let female = gender.iter().find(|g| g.gender == "F").expect("female row");
        assert_eq!(female.total_candidates, 1);
        assert_eq!(female.total_winners, 0);
    }
}
