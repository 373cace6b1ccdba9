//! SQLite-backed store.
//!
//! Each top-level document (`games/{id}`) is one row holding its JSON body.
//! An update groups its paths by document and rewrites the touched rows in a
//! single database transaction; subscribers are notified after the commit.

use std::collections::BTreeMap;

use async_trait::async_trait;
use sea_orm::{
    ActiveValue, DatabaseConnection, EntityTrait, TransactionTrait, sea_query::OnConflict,
};
use serde_json::Value;

use super::{DocumentStore, Notifier, Subscription, now_millis, watch_path};
use crate::{
    EngineError, ResultEngine,
    document::{self, Patch, Path},
};

/// Segments naming a document: collection and key.
const DOCUMENT_DEPTH: usize = 2;

pub(crate) mod documents {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
    #[sea_orm(table_name = "documents")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub path: String,
        #[sea_orm(column_type = "Text")]
        pub body: String,
        pub updated_at: i64,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

#[derive(Clone, Debug)]
pub struct SqliteStore {
    database: DatabaseConnection,
    notifier: Notifier,
}

impl SqliteStore {
    /// Wraps an already migrated connection.
    pub fn new(database: DatabaseConnection) -> Self {
        Self {
            database,
            notifier: Notifier::default(),
        }
    }
}

fn split_document(path: &Path) -> ResultEngine<(String, Path)> {
    if path.len() < DOCUMENT_DEPTH {
        return Err(EngineError::InvalidPath(format!(
            "'{path}' does not address a document (expected collection/key)"
        )));
    }
    let (document, rest) = path.split_at(DOCUMENT_DEPTH);
    Ok((document.to_string(), rest))
}

#[async_trait]
impl DocumentStore for SqliteStore {
    async fn get(&self, path: &str) -> ResultEngine<Option<Value>> {
        let path = Path::parse(path)?;
        let (key, rest) = split_document(&path)?;
        let Some(model) = documents::Entity::find_by_id(key)
            .one(&self.database)
            .await?
        else {
            return Ok(None);
        };
        let tree: Value = serde_json::from_str(&model.body)?;
        Ok(document::get(&tree, &rest).cloned())
    }

    async fn update(&self, patch: Patch) -> ResultEngine<()> {
        let updates = patch.validate()?;
        let mut changed = Vec::with_capacity(updates.len());
        let mut grouped: BTreeMap<String, Vec<(Path, Value)>> = BTreeMap::new();
        for (path, value) in updates {
            let (key, rest) = split_document(&path)?;
            changed.push(path);
            grouped.entry(key).or_default().push((rest, value));
        }

        let now = now_millis();
        let db_tx = self.database.begin().await?;
        for (key, updates) in grouped {
            let mut tree = match documents::Entity::find_by_id(key.clone())
                .one(&db_tx)
                .await?
            {
                Some(model) => serde_json::from_str(&model.body)?,
                None => Value::Null,
            };
            document::apply(&mut tree, updates, now);

            if tree.is_null() {
                documents::Entity::delete_by_id(key).exec(&db_tx).await?;
                continue;
            }
            let row = documents::ActiveModel {
                path: ActiveValue::Set(key),
                body: ActiveValue::Set(serde_json::to_string(&tree)?),
                updated_at: ActiveValue::Set(now),
            };
            documents::Entity::insert(row)
                .on_conflict(
                    OnConflict::column(documents::Column::Path)
                        .update_columns([documents::Column::Body, documents::Column::UpdatedAt])
                        .to_owned(),
                )
                .exec(&db_tx)
                .await?;
        }
        db_tx.commit().await?;

        tracing::debug!(paths = changed.len(), "sqlite store committed update");
        self.notifier.notify(changed);
        Ok(())
    }

    fn subscribe(&self, path: &str) -> ResultEngine<Subscription> {
        let path = Path::parse(path)?;
        split_document(&path)?;
        let receiver = self.notifier.receiver();
        Ok(watch_path(self.clone(), path, receiver))
    }
}
