use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Transaction, TransactionBehavior};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{error, info};
use uuid::Uuid;

use crate::error::Error;
use crate::survey::types::{Answer, AnswerMap, ResultId};

/// Partial update of a stored answer: per-quiz answers are merged, `result_id` replaces.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerPatch {
    #[serde(default)]
    pub answers: AnswerMap,
    #[serde(default)]
    pub result_id: Option<ResultId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultCount {
    pub result_id: ResultId,
    pub count: u64,
}

pub struct AnswerStore {
    conn: Connection,
}

fn now_string() -> String {
    Utc::now().to_rfc3339()
}

fn init_schema(conn: &Connection) -> Result<(), Error> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS answers (
            id TEXT PRIMARY KEY,
            survey_id TEXT NOT NULL,
            answers TEXT NOT NULL,
            result_id TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
          );
          CREATE INDEX IF NOT EXISTS idx_answers_survey ON answers(survey_id);",
    )?;
    Ok(())
}

fn read_answer(conn: &Connection, survey_id: &str, answer_id: &str) -> Result<Option<Answer>, Error> {
    let row = conn
        .query_row(
            "SELECT id, answers, result_id FROM answers WHERE survey_id = ?1 AND id = ?2",
            params![survey_id, answer_id],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, Option<String>>(2)?,
                ))
            },
        )
        .optional()?;

    let Some((id, raw_answers, result_id)) = row else {
        return Ok(None);
    };
    Ok(Some(Answer {
        id,
        answers: serde_json::from_str(&raw_answers)?,
        result_id,
    }))
}

impl AnswerStore {
    pub fn open(path: &Path) -> Result<Self, Error> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        init_schema(&conn)?;
        info!(path = %path.display(), "opened answer store");
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self, Error> {
        let conn = Connection::open_in_memory()?;
        init_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Starts a respondent session with no answers.
    pub fn create_answer(&self, survey_id: &str) -> Result<Answer, Error> {
        let answer = Answer {
            id: Uuid::new_v4().to_string(),
            answers: AnswerMap::new(),
            result_id: None,
        };
        let now = now_string();
        self.conn.execute(
            "INSERT INTO answers (id, survey_id, answers, result_id, created_at, updated_at) \
            VALUES (?1, ?2, ?3, NULL, ?4, ?4)",
            params![answer.id, survey_id, serde_json::to_string(&answer.answers)?, now],
        )?;
        Ok(answer)
    }

    pub fn get_answer(&self, survey_id: &str, answer_id: &str) -> Result<Option<Answer>, Error> {
        read_answer(&self.conn, survey_id, answer_id)
    }

    /// Merges `patch` into the stored answer. The read and the write share one immediate
    /// transaction, so concurrent patches from other connections cannot drop quiz answers.
    pub fn put_answer(
        &self,
        survey_id: &str,
        answer_id: &str,
        patch: &AnswerPatch,
    ) -> Result<Answer, Error> {
        let tx = Transaction::new_unchecked(&self.conn, TransactionBehavior::Immediate)?;
        let mut answer = read_answer(&tx, survey_id, answer_id)?.ok_or_else(|| {
            Error::NotFound(format!("Answer {answer_id} not found in survey {survey_id}."))
        })?;
        for (quiz_id, value) in &patch.answers {
            answer.answers.insert(quiz_id.clone(), value.clone());
        }
        if patch.result_id.is_some() {
            answer.result_id = patch.result_id.clone();
        }

        tx.execute(
            "UPDATE answers SET answers = ?1, result_id = ?2, updated_at = ?3 \
            WHERE survey_id = ?4 AND id = ?5",
            params![
                serde_json::to_string(&answer.answers)?,
                answer.result_id,
                now_string(),
                survey_id,
                answer_id
            ],
        )?;
        tx.commit()?;
        Ok(answer)
    }

    /// How many answers resolved to each result, most frequent first.
    pub fn result_distribution(&self, survey_id: &str) -> Result<Vec<ResultCount>, Error> {
        let mut stmt = self.conn.prepare(
            "SELECT result_id, COUNT(*) FROM answers \
            WHERE survey_id = ?1 AND result_id IS NOT NULL \
            GROUP BY result_id ORDER BY COUNT(*) DESC, result_id ASC",
        )?;
        let rows = stmt.query_map(params![survey_id], |row| {
            Ok(ResultCount {
                result_id: row.get(0)?,
                count: row.get::<_, i64>(1)?.max(0) as u64,
            })
        })?;

        let mut counts = Vec::new();
        for row in rows {
            counts.push(row?);
        }
        Ok(counts)
    }
}

/// Saves a resolved result without letting a storage failure reach the respondent.
/// Returns whether the write succeeded; failures are logged and not retried.
pub fn save_result_or_log(
    store: &AnswerStore,
    survey_id: &str,
    answer_id: &str,
    result_id: &str,
) -> bool {
    let patch = AnswerPatch {
        answers: AnswerMap::new(),
        result_id: Some(result_id.to_string()),
    };
    match store.put_answer(survey_id, answer_id, &patch) {
        Ok(_) => true,
        Err(e) => {
            error!(
                survey = survey_id,
                answer = answer_id,
                result = result_id,
                "failed to save resolved result: {e}"
            );
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{save_result_or_log, AnswerPatch, AnswerStore, ResultCount};
    use crate::error::Error;
    use crate::survey::types::{AnswerMap, AnswerValue};

    fn patch_values(quiz_id: &str, values: &[&str]) -> AnswerPatch {
        let mut answers = AnswerMap::new();
        answers.insert(
            quiz_id.to_string(),
            AnswerValue {
                values: values.iter().map(|v| v.to_string()).collect(),
            },
        );
        AnswerPatch {
            answers,
            result_id: None,
        }
    }

    #[test]
    fn answers_are_patched_incrementally() {
        let store = AnswerStore::open_in_memory().expect("store");
        let answer = store.create_answer("s1").expect("create");
        store
            .put_answer("s1", &answer.id, &patch_values("q1", &["a"]))
            .expect("patch q1");
        store
            .put_answer("s1", &answer.id, &patch_values("q2", &["b", "c"]))
            .expect("patch q2");

        let stored = store
            .get_answer("s1", &answer.id)
            .expect("get")
            .expect("exists");
        assert_eq!(stored.answers["q1"].values, vec!["a"]);
        assert_eq!(stored.answers["q2"].values, vec!["b", "c"]);
        assert_eq!(stored.result_id, None);
        assert!(store.get_answer("other", &answer.id).expect("get").is_none());
    }

    #[test]
    fn unknown_answers_are_not_found() {
        let store = AnswerStore::open_in_memory().expect("store");
        let err = store
            .put_answer("s1", "missing", &AnswerPatch::default())
            .expect_err("missing answer");
        assert!(matches!(err, Error::NotFound(_)));
        assert!(!save_result_or_log(&store, "s1", "missing", "r1"));

        // The failed merge rolled back, so the next one can start its own transaction.
        let answer = store.create_answer("s1").expect("create");
        store
            .put_answer("s1", &answer.id, &patch_values("q1", &["a"]))
            .expect("patch after failure");
    }

    #[test]
    fn patches_from_two_connections_are_both_kept() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("answers.sqlite3");
        let first = AnswerStore::open(&path).expect("open first");
        let second = AnswerStore::open(&path).expect("open second");
        let answer = first.create_answer("s1").expect("create");

        first
            .put_answer("s1", &answer.id, &patch_values("q1", &["a"]))
            .expect("patch q1");
        second
            .put_answer("s1", &answer.id, &patch_values("q2", &["b"]))
            .expect("patch q2");
        first
            .put_answer("s1", &answer.id, &patch_values("q3", &["c"]))
            .expect("patch q3");

        let stored = second
            .get_answer("s1", &answer.id)
            .expect("get")
            .expect("exists");
        let mut quiz_ids = stored.answers.keys().map(String::as_str).collect::<Vec<_>>();
        quiz_ids.sort();
        assert_eq!(quiz_ids, vec!["q1", "q2", "q3"]);
    }

    #[test]
    fn distribution_counts_resolved_answers() {
        let store = AnswerStore::open_in_memory().expect("store");
        for result_id in ["r2", "r1", "r2"] {
            let answer = store.create_answer("s1").expect("create");
            assert!(save_result_or_log(&store, "s1", &answer.id, result_id));
        }
        store.create_answer("s1").expect("unresolved");
        let other = store.create_answer("s2").expect("create");
        assert!(save_result_or_log(&store, "s2", &other.id, "r9"));

        let counts = store.result_distribution("s1").expect("distribution");
        assert_eq!(
            counts,
            vec![
                ResultCount { result_id: "r2".to_string(), count: 2 },
                ResultCount { result_id: "r1".to_string(), count: 1 },
            ]
        );
    }

    #[test]
    fn store_persists_across_reopen() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("answers.sqlite3");
        let answer_id = {
            let store = AnswerStore::open(&path).expect("open");
            let answer = store.create_answer("s1").expect("create");
            assert!(save_result_or_log(&store, "s1", &answer.id, "r1"));
            answer.id
        };
        let store = AnswerStore::open(&path).expect("reopen");
        let stored = store.get_answer("s1", &answer_id).expect("get").expect("exists");
        assert_eq!(stored.result_id.as_deref(), Some("r1"));
    }
}
