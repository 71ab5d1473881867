pub const CREATE_CHECKINS: &str = r#"
CREATE TABLE IF NOT EXISTS checkins (
  date      TEXT PRIMARY KEY,
  completed INTEGER NOT NULL,
  note      TEXT
);
"#;

pub const INSERT_CHECKIN: &str =
    "INSERT INTO checkins (date, completed, note) VALUES (?1, ?2, ?3)";

pub const SELECT_CHECKIN: &str =
    "SELECT date, completed, COALESCE(note, '') FROM checkins WHERE date = ?1";

pub const SELECT_RECENT_CHECKINS: &str = "SELECT date, completed, COALESCE(note, '')
     FROM checkins
     ORDER BY date DESC
     LIMIT ?1";

pub const SELECT_COMPLETED_DATES_DESC: &str =
    "SELECT date FROM checkins WHERE completed = 1 ORDER BY date DESC";

pub fn schema_statements() -> Vec<&'static str> {
    vec![CREATE_CHECKINS]
}
