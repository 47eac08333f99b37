use crate::core::RosterSource;
use crate::domain::model::{Roster, Student, StudentId};
use crate::utils::error::Result;
use async_trait::async_trait;

/// `id,name` 格式的 CSV 名單
#[derive(Debug, Clone)]
pub struct CsvRoster {
    path: String,
}

impl CsvRoster {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

pub fn parse_roster_csv(data: &[u8]) -> Result<Roster> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(data);

    let mut students = Vec::new();
    for record in reader.deserialize::<Student>() {
        students.push(record?);
    }
    tracing::debug!("Parsed {} students from roster CSV", students.len());
    Roster::new(students)
}

#[async_trait]
impl RosterSource for CsvRoster {
    async fn load_roster(&self) -> Result<Roster> {
        let data = tokio::fs::read(&self.path).await?;
        parse_roster_csv(&data)
    }
}

/// 直接由 id 清單組成的名單
#[derive(Debug, Clone)]
pub struct IdListRoster {
    ids: Vec<StudentId>,
}

impl IdListRoster {
    pub fn new(ids: Vec<StudentId>) -> Self {
        Self { ids }
    }
}

#[async_trait]
impl RosterSource for IdListRoster {
    async fn load_roster(&self) -> Result<Roster> {
        Roster::from_ids(&self.ids)
    }
}
