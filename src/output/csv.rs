use anyhow::Result;

use crate::query::{CandidateLookup, MarginRecord, PartySeatShare, StateTurnout};

fn optional<T: ToString>(value: &Option<T>) -> String {
    value.as_ref().map(ToString::to_string).unwrap_or_default()
}

fn finish(writer: csv::Writer<Vec<u8>>) -> Result<String> {
    let data = writer.into_inner()?;
    Ok(String::from_utf8_lossy(&data).to_string())
}

pub fn seat_share_to_csv(rows: &[PartySeatShare]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(vec![]);
    writer.write_record(["year", "state_name", "party", "seats"])?;
    for r in rows {
        writer.write_record([
            r.year.to_string(),
            optional(&r.state_name),
            r.party.clone(),
            r.seats.to_string(),
        ])?;
    }
    finish(writer)
}

pub fn turnout_to_csv(rows: &[StateTurnout]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(vec![]);
    writer.write_record(["year", "state_name", "turnout_pct", "electors", "valid_votes"])?;
    for r in rows {
        writer.write_record([
            r.year.to_string(),
            r.state_name.clone(),
            format!("{:.4}", r.turnout_pct),
            r.electors.to_string(),
            r.valid_votes.to_string(),
        ])?;
    }
    finish(writer)
}

pub fn margins_to_csv(rows: &[MarginRecord]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(vec![]);
    writer.write_record(["year", "state_name", "constituency_name", "party", "margin"])?;
    for r in rows {
        writer.write_record([
            r.year.to_string(),
            r.state_name.clone(),
            r.constituency_name.clone(),
            r.party.clone(),
            optional(&r.margin),
        ])?;
    }
    finish(writer)
}

pub fn search_to_csv(rows: &[CandidateLookup]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(vec![]);
    writer.write_record([
        "year",
        "state_name",
        "constituency_name",
        "candidate_name",
        "party",
        "gender",
        "position",
        "votes",
        "margin",
    ])?;
    for r in rows {
        writer.write_record([
            r.year.to_string(),
            r.state_name.clone(),
            r.constituency_name.clone(),
            optional(&r.candidate_name),
            r.party.clone(),
            optional(&r.gender),
            optional(&r.position),
            optional(&r.votes),
            optional(&r.margin),
        ])?;
    }
    finish(writer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seat_share_rows_carry_their_state() {
        let row = |state: Option<&str>| PartySeatShare {
            year: 1999,
            party: "BJP".to_string(),
            seats: 1,
            state_name: state.map(str::to_string),
        };
        let out = seat_share_to_csv(&[row(Some("Goa")), row(Some("Kerala")), row(None)])
            .expect("csv");
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(
            lines,
            vec![
                "year,state_name,party,seats",
                "1999,Goa,BJP,1",
                "1999,Kerala,BJP,1",
                "1999,,BJP,1",
            ]
        );
    }

    #[test]
    fn margins_leave_missing_values_blank() {
        let out = margins_to_csv(&[MarginRecord {
            year: 2004,
            state_name: "Tamil_Nadu".to_string(),
            constituency_name: "Chennai, South".to_string(),
            party: "DMK".to_string(),
            margin: None,
        }])
        .expect("csv");
        let mut lines = out.lines();
        assert_eq!(
            lines.next(),
            Some("year,state_name,constituency_name,party,margin")
        );
        assert_eq!(lines.next(), Some("2004,Tamil_Nadu,\"Chennai, South\",DMK,"));
    }
}
