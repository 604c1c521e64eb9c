//! CSV export of the loaded student list.

use crate::model::Student;

/// Render `students` as CSV with a header row.
pub fn students_csv(students: &[Student]) -> anyhow::Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(["Name", "Email", "Phone", "Handle", "Current", "Max"])?;

    for s in students {
        let current = s.current_rating.to_string();
        let max = s.max_rating.to_string();
        writer.write_record([
            s.name.as_str(),
            s.email.as_str(),
            s.phone.as_deref().unwrap_or(""),
            s.codeforces_handle.as_str(),
            current.as_str(),
            max.as_str(),
        ])?;
    }

    let bytes = writer.into_inner().map_err(|e| e.into_error())?;
    Ok(String::from_utf8(bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn student(name: &str, phone: Option<&str>) -> Student {
        Student {
            id: name.to_lowercase(),
            name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
            phone: phone.map(str::to_string),
            codeforces_handle: name.to_lowercase(),
            current_rating: 1500,
            max_rating: 1620,
            rank: String::new(),
            max_rank: String::new(),
            last_synced_at: None,
            reminders_sent: 0,
            title_photo: None,
            emails_disabled: false,
            contests: vec![],
            problems: vec![],
            submissions: vec![],
            problem_stats: None,
        }
    }

    #[test]
    fn test_csv_rows() {
        let csv = students_csv(&[student("Alice", Some("555-0100")), student("Bob", None)]).unwrap();

        assert_eq!(
            csv,
            "Name,Email,Phone,Handle,Current,Max\n\
             Alice,alice@example.com,555-0100,alice,1500,1620\n\
             Bob,bob@example.com,,bob,1500,1620\n"
        );
    }

    #[test]
    fn test_csv_quotes_commas() {
        let csv = students_csv(&[student("Lee, Ann", None)]).unwrap();

        assert!(csv.contains("\"Lee, Ann\""));
    }
}
