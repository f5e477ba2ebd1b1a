//! 记录集合
//!
//! 按插入顺序保存同一类记录，所有查询都是线性扫描。

use hospital_core::utils::next_id;
use hospital_core::{HospitalError, Record, Result};

/// 单类记录的内存集合
#[derive(Debug, Clone)]
pub struct RecordCollection<T: Record> {
    items: Vec<T>,
}

impl<T: Record> RecordCollection<T> {
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// 由已加载的记录构建集合，重复ID只保留第一条
    pub fn from_records(records: Vec<T>) -> Self {
        let mut collection = Self::new();
        for record in records {
            if collection.contains(record.id()) {
                tracing::warn!("Dropping duplicate {} {} on load", T::KIND, record.id());
                continue;
            }
            collection.items.push(record);
        }
        collection
    }

    /// 追加记录，ID已存在时拒绝
    pub fn insert(&mut self, record: T) -> Result<()> {
        if record.id().trim().is_empty() {
            return Err(HospitalError::Validation(format!("{} id cannot be empty", T::KIND)));
        }
        if self.contains(record.id()) {
            return Err(HospitalError::duplicate(T::KIND, record.id()));
        }
        self.items.push(record);
        Ok(())
    }

    pub fn list(&self) -> &[T] {
        &self.items
    }

    pub fn get(&self, id: &str) -> Option<&T> {
        self.items.iter().find(|item| item.id() == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn search(&self, query: &str) -> Vec<&T> {
        self.items.iter().filter(|item| item.matches(query)).collect()
    }

    pub fn filter<P>(&self, predicate: P) -> Vec<&T>
    where
        P: Fn(&T) -> bool,
    {
        self.items.iter().filter(|item| predicate(*item)).collect()
    }

    /// 删除第一条匹配ID的记录
    pub fn remove(&mut self, id: &str) -> Result<T> {
        let position = self
            .items
            .iter()
            .position(|item| item.id() == id)
            .ok_or_else(|| HospitalError::not_found(T::KIND, id))?;
        Ok(self.items.remove(position))
    }

    /// 删除所有满足条件的记录，返回删除数量
    pub fn remove_where<P>(&mut self, predicate: P) -> usize
    where
        P: Fn(&T) -> bool,
    {
        let before = self.items.len();
        self.items.retain(|item| !predicate(item));
        before - self.items.len()
    }

    pub fn next_id(&self) -> String {
        next_id(T::KIND.id_prefix(), self.items.iter().map(|item| item.id()))
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<T: Record> Default for RecordCollection<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hospital_core::{Doctor, Patient};

    fn sample() -> RecordCollection<Patient> {
        let mut patients = RecordCollection::new();
        patients.insert(Patient::new("P1", "Ali Khan", 21)).unwrap();
        patients.insert(Patient::new("P2", "Sara Ali", 34)).unwrap();
        patients.insert(Patient::new("P3", "Omar", 50)).unwrap();
        patients
    }

    #[test]
    fn test_insert_keeps_order() {
        let patients = sample();
        let ids: Vec<&str> = patients.list().iter().map(|p| p.patient_id.as_str()).collect();
        assert_eq!(ids, vec!["P1", "P2", "P3"]);
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let mut patients = sample();
        let result = patients.insert(Patient::new("P2", "Someone Else", 60));

        assert!(matches!(result, Err(HospitalError::Duplicate { .. })));
        assert_eq!(patients.len(), 3);
        assert_eq!(patients.get("P2").unwrap().name, "Sara Ali");
    }

    #[test]
    fn test_empty_id_rejected() {
        let mut doctors = RecordCollection::new();
        let result = doctors.insert(Doctor::new("  ", "House", "Diagnostics"));
        assert!(matches!(result, Err(HospitalError::Validation(_))));
    }

    #[test]
    fn test_search_by_id_and_name() {
        let patients = sample();

        let by_name: Vec<&str> = patients.search("ali").into_iter().map(|p| p.id()).collect();
        assert_eq!(by_name, vec!["P1", "P2"]);

        let by_id: Vec<&str> = patients.search("P3").into_iter().map(|p| p.id()).collect();
        assert_eq!(by_id, vec!["P3"]);
    }

    #[test]
    fn test_remove_missing_is_noop() {
        let mut patients = sample();
        let result = patients.remove("P9");

        assert!(matches!(result, Err(HospitalError::NotFound { .. })));
        assert_eq!(patients.len(), 3);
    }

    #[test]
    fn test_remove_where_and_next_id() {
        let mut patients = sample();
        assert_eq!(patients.remove_where(|p| p.age > 30), 2);
        assert_eq!(patients.next_id(), "P2");
    }

    #[test]
    fn test_from_records_drops_duplicates() {
        let patients = RecordCollection::from_records(vec![
            Patient::new("P1", "Ali", 21),
            Patient::new("P1", "Copy", 22),
        ]);
        assert_eq!(patients.len(), 1);
        assert_eq!(patients.get("P1").unwrap().name, "Ali");
    }
}
