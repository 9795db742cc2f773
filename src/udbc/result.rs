use crate::error::DbError;
use crate::udbc::deserializer::RowDeserializer;
use crate::udbc::value::Value;
use serde::de::DeserializeOwned;
use std::sync::Arc;

/// 查询结果：列元数据 + 按顺序排列的行
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    columns: Arc<[String]>,
    rows: Vec<Vec<Value>>,
}

/// A borrowed view of one row of a [`ResultSet`].
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    columns: &'a [String],
    values: &'a [Value],
}

impl ResultSet {
    /// Every row must have exactly one value per column.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Result<Self, DbError> {
        if let Some(bad) = rows.iter().position(|r| r.len() != columns.len()) {
            return Err(DbError::Value(format!(
                "row {} has {} values, expected {}",
                bad,
                rows[bad].len(),
                columns.len()
            )));
        }
        Ok(Self {
            columns: columns.into(),
            rows,
        })
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row(&self, index: usize) -> Option<Row<'_>> {
        self.rows.get(index).map(|values| Row {
            columns: &self.columns,
            values,
        })
    }

    pub fn rows(&self) -> impl Iterator<Item = Row<'_>> {
        self.rows.iter().map(|values| Row {
            columns: &self.columns,
            values,
        })
    }

    pub fn into_rows(self) -> Vec<Vec<Value>> {
        self.rows
    }

    /// 将行数据映射为目标类型
    pub fn map_rows<R: DeserializeOwned>(&self) -> Result<Vec<R>, DbError> {
        self.rows().map(|row| row.deserialize()).collect()
    }
}

impl<'a> Row<'a> {
    pub fn get(&self, column: &str) -> Option<&'a Value> {
        let values = self.values;
        self.columns
            .iter()
            .position(|c| c == column)
            .and_then(|i| values.get(i))
    }

    pub fn values(&self) -> &'a [Value] {
        self.values
    }

    pub fn columns(&self) -> &'a [String] {
        self.columns
    }

    pub fn deserialize<R: DeserializeOwned>(&self) -> Result<R, DbError> {
        R::deserialize(RowDeserializer::new(self.columns, self.values))
    }
}

/// `INSERT` / `UPDATE` / `DELETE` 的执行结果
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateResult {
    /// 受影响的行数
    pub updated: u64,
    /// 自增主键等生成的键
    pub keys: Vec<Value>,
}

impl UpdateResult {
    pub fn new(updated: u64) -> Self {
        Self {
            updated,
            keys: Vec::new(),
        }
    }

    pub fn with_key(mut self, key: impl Into<Value>) -> Self {
        self.keys.push(key.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    fn users() -> ResultSet {
        ResultSet::new(
            vec!["id".into(), "name".into(), "nickname".into()],
            vec![
                vec![Value::I64(1), Value::Bytes(b"alice".to_vec()), Value::Null],
                vec![Value::I64(2), Value::Str("bob".into()), Value::from("b")],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_rejects_ragged_rows() {
        let err = ResultSet::new(vec!["a".into()], vec![vec![]]).unwrap_err();
        assert!(matches!(err, DbError::Value(_)));
    }

    #[test]
    fn test_get_by_column_name() {
        let rs = users();
        assert_eq!(rs.len(), 2);
        let row = rs.row(1).unwrap();
        assert_eq!(row.get("name"), Some(&Value::Str("bob".into())));
        assert_eq!(row.get("missing"), None);
    }

    #[test]
    fn test_map_rows() {
        #[derive(Deserialize, Debug, PartialEq)]
        struct User {
            id: i64,
            name: String,
            nickname: Option<String>,
        }

        let users: Vec<User> = users().map_rows().unwrap();
        assert_eq!(
            users,
            vec![
                User {
                    id: 1,
                    name: "alice".into(),
                    nickname: None,
                },
                User {
                    id: 2,
                    name: "bob".into(),
                    nickname: Some("b".into()),
                },
            ]
        );
    }
}
