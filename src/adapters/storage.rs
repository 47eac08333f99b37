use crate::core::Storage;
use crate::domain::model::AssignmentSnapshot;
use crate::utils::error::Result;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct LocalStorage {
    base_path: String,
}

impl LocalStorage {
    pub fn new(base_path: String) -> Self {
        Self { base_path }
    }

    fn full_path(&self, path: &str) -> PathBuf {
        Path::new(&self.base_path).join(path)
    }
}

impl Storage for LocalStorage {
    async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        let data = tokio::fs::read(self.full_path(path)).await?;
        Ok(data)
    }

    async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
        let full_path = self.full_path(path);

        if let Some(parent) = full_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        tokio::fs::write(full_path, data).await?;
        Ok(())
    }
}

/// 以 JSON 保存結果快照，回傳寫入的相對路徑
pub async fn save_snapshot<S: Storage>(
    storage: &S,
    name: &str,
    snapshot: &AssignmentSnapshot,
    pretty: bool,
) -> Result<String> {
    let data = if pretty {
        serde_json::to_vec_pretty(snapshot)?
    } else {
        serde_json::to_vec(snapshot)?
    };
    let file_name = format!("{}.json", name);
    storage.write_file(&file_name, &data).await?;
    tracing::debug!("Saved assignment snapshot to {}", file_name);
    Ok(file_name)
}

pub async fn load_snapshot<S: Storage>(storage: &S, name: &str) -> Result<AssignmentSnapshot> {
    let data = storage.read_file(&format!("{}.json", name)).await?;
    Ok(serde_json::from_slice(&data)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::allocator::allocate;
    use crate::domain::model::Assignment;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_snapshot_survives_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(temp_dir.path().to_str().unwrap().to_string());

        let pairing = allocate(&[1, 2, 3, 4], 2, &mut StdRng::seed_from_u64(3)).unwrap();
        let snapshot = AssignmentSnapshot::new(Some(3), Assignment::Reviews(pairing.clone()));

        let file = save_snapshot(&storage, "assignment-1", &snapshot, true)
            .await
            .unwrap();
        assert_eq!(file, "assignment-1.json");
        assert!(temp_dir.path().join("assignment-1.json").exists());

        let loaded = load_snapshot(&storage, "assignment-1").await.unwrap();
        assert_eq!(loaded.assignment, Assignment::Reviews(pairing));
        assert_eq!(loaded.seed, Some(3));
    }

    #[tokio::test]
    async fn test_missing_file_is_io_error() {
        let temp_dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(temp_dir.path().to_str().unwrap().to_string());
        let result = storage.read_file("nope.json").await;
        assert!(matches!(
            result,
            Err(crate::utils::error::EngineError::IoError(_))
        ));
    }
}
