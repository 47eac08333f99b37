// 介接層：domain ports 的具體實作 (檔案儲存、名單來源)

pub mod roster;
pub mod storage;
