//! The store actor: owns every table and answers [`StoreRequest`]s one at a time.

use std::collections::HashMap;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::framework::error::StoreError;
use crate::framework::model::{Attributes, Model, ValidationErrors};
use crate::framework::record::Record;
use crate::store::client::StoreClient;
use crate::store::schema::{Relation, Schema};

/// Type alias for the one-shot response channel used by the store actor.
pub type Response<T> = oneshot::Sender<Result<T, StoreError>>;

/// A record after a save, update or destroy attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct Persisted {
    pub record: Record,
    pub saved: bool,
}

/// Messages understood by [`StoreActor`]. Each maps onto one [`Loader`] or [`Mutator`] call.
///
/// [`Loader`]: crate::framework::Loader
/// [`Mutator`]: crate::framework::Mutator
#[derive(Debug)]
pub enum StoreRequest {
    Find {
        model: String,
        id: String,
        respond_to: Response<Option<Record>>,
    },
    All {
        model: String,
        respond_to: Response<Vec<Record>>,
    },
    Children {
        parent: Record,
        accessor: String,
        respond_to: Response<Vec<Record>>,
    },
    FindChild {
        parent: Record,
        accessor: String,
        id: String,
        respond_to: Response<Option<Record>>,
    },
    BuildChild {
        parent: Record,
        accessor: String,
        attrs: Attributes,
        respond_to: Response<Record>,
    },
    SingletonChild {
        parent: Record,
        accessor: String,
        respond_to: Response<Option<Record>>,
    },
    BuildSingletonChild {
        parent: Record,
        accessor: String,
        attrs: Attributes,
        respond_to: Response<Record>,
    },
    Owner {
        record: Record,
        association: String,
        respond_to: Response<Option<Record>>,
    },
    Save {
        record: Record,
        respond_to: Response<Persisted>,
    },
    Update {
        record: Record,
        attrs: Attributes,
        respond_to: Response<Persisted>,
    },
    Destroy {
        record: Record,
        respond_to: Response<Persisted>,
    },
}

/// In-memory model store.
///
/// Tables are only touched from [`run`](StoreActor::run), so no locking is needed; many
/// controllers on many tasks share one actor through cloned [`StoreClient`]s.
pub struct StoreActor {
    receiver: mpsc::Receiver<StoreRequest>,
    schema: Schema,
    tables: HashMap<String, Vec<Record>>,
    next_id: u64,
}

fn foreign_key_of(parent: &Record) -> serde_json::Value {
    serde_json::Value::from(parent.id().unwrap_or_default())
}

fn linked(record: &Record, relation: &Relation, parent: &Record) -> bool {
    parent.id().is_some() && record.attribute(&relation.foreign_key) == Some(&foreign_key_of(parent))
}

impl StoreActor {
    pub fn new(buffer_size: usize, schema: Schema) -> (Self, StoreClient) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let actor = Self {
            receiver,
            schema,
            tables: HashMap::new(),
            next_id: 1,
        };
        (actor, StoreClient::new(sender))
    }

    /// Runs the event loop until every client is dropped.
    pub async fn run(mut self) {
        info!("Store started");

        while let Some(msg) = self.receiver.recv().await {
            match msg {
                StoreRequest::Find { model, id, respond_to } => {
                    let found = self.find(&model, &id);
                    debug!(%model, %id, found = found.is_some(), "Find");
                    let _ = respond_to.send(Ok(found));
                }
                StoreRequest::All { model, respond_to } => {
                    let records = self.table(&model).to_vec();
                    debug!(%model, count = records.len(), "All");
                    let _ = respond_to.send(Ok(records));
                }
                StoreRequest::Children {
                    parent,
                    accessor,
                    respond_to,
                } => {
                    let result = self.children(&parent, &accessor);
                    debug!(%parent, %accessor, ok = result.is_ok(), "Children");
                    let _ = respond_to.send(result);
                }
                StoreRequest::FindChild {
                    parent,
                    accessor,
                    id,
                    respond_to,
                } => {
                    let result = self
                        .children(&parent, &accessor)
                        .map(|records| records.into_iter().find(|r| r.id() == Some(id.as_str())));
                    debug!(%parent, %accessor, %id, "FindChild");
                    let _ = respond_to.send(result);
                }
                StoreRequest::BuildChild {
                    parent,
                    accessor,
                    attrs,
                    respond_to,
                } => {
                    let result = self
                        .schema
                        .has_many_relation(parent.model_name(), &accessor)
                        .map(|relation| Self::build_for(relation, &parent, attrs));
                    debug!(%parent, %accessor, "BuildChild");
                    let _ = respond_to.send(result);
                }
                StoreRequest::SingletonChild {
                    parent,
                    accessor,
                    respond_to,
                } => {
                    let result = self.singleton_child(&parent, &accessor);
                    debug!(%parent, %accessor, "SingletonChild");
                    let _ = respond_to.send(result);
                }
                StoreRequest::BuildSingletonChild {
                    parent,
                    accessor,
                    attrs,
                    respond_to,
                } => {
                    let result = self
                        .schema
                        .has_one_relation(parent.model_name(), &accessor)
                        .map(|relation| Self::build_for(relation, &parent, attrs));
                    debug!(%parent, %accessor, "BuildSingletonChild");
                    let _ = respond_to.send(result);
                }
                StoreRequest::Owner {
                    record,
                    association,
                    respond_to,
                } => {
                    let result = self.owner(&record, &association);
                    debug!(%record, %association, "Owner");
                    let _ = respond_to.send(result);
                }
                StoreRequest::Save { record, respond_to } => {
                    let _ = respond_to.send(self.save(record));
                }
                StoreRequest::Update {
                    mut record,
                    attrs,
                    respond_to,
                } => {
                    record.assign(attrs);
                    let _ = respond_to.send(self.save(record));
                }
                StoreRequest::Destroy { record, respond_to } => {
                    let _ = respond_to.send(Ok(self.destroy(record)));
                }
            }
        }

        let size: usize = self.tables.values().map(Vec::len).sum();
        info!(size, "Store shutdown");
    }

    fn table(&self, model: &str) -> &[Record] {
        self.tables.get(model).map(Vec::as_slice).unwrap_or(&[])
    }

    fn find(&self, model: &str, id: &str) -> Option<Record> {
        self.table(model).iter().find(|r| r.id() == Some(id)).cloned()
    }

    fn children(&self, parent: &Record, accessor: &str) -> Result<Vec<Record>, StoreError> {
        let relation = self.schema.has_many_relation(parent.model_name(), accessor)?;
        Ok(self
            .table(&relation.model)
            .iter()
            .filter(|r| linked(r, relation, parent))
            .cloned()
            .collect())
    }

    fn singleton_child(&self, parent: &Record, accessor: &str) -> Result<Option<Record>, StoreError> {
        let relation = self.schema.has_one_relation(parent.model_name(), accessor)?;
        Ok(self
            .table(&relation.model)
            .iter()
            .find(|r| linked(r, relation, parent))
            .cloned())
    }

    fn owner(&self, record: &Record, association: &str) -> Result<Option<Record>, StoreError> {
        let relations = self.schema.owner_relations(record.model_name(), association)?;
        let owner = relations.iter().find_map(|relation| {
            match record.attribute(&relation.foreign_key) {
                Some(serde_json::Value::String(id)) => Some(self.find(&relation.model, id)),
                _ => None,
            }
        });
        Ok(owner.flatten())
    }

    fn build_for(relation: &Relation, parent: &Record, attrs: Attributes) -> Record {
        Record::unsaved(relation.model.clone(), attrs)
            .with_attribute(relation.foreign_key.clone(), foreign_key_of(parent))
    }

    fn save(&mut self, mut record: Record) -> Result<Persisted, StoreError> {
        let model = record.model_name().to_string();
        let position = record.id().map(|id| {
            self.table(&model)
                .iter()
                .position(|r| r.id() == Some(id))
        });
        if let Some(None) = position {
            warn!(%record, "Save of a record that is no longer stored");
            return Err(StoreError::RecordMissing(record.to_string()));
        }

        let blank = self.schema.blank_attributes(record.model_name(), record.attributes());
        if !blank.is_empty() {
            let mut errors = ValidationErrors::new();
            for attribute in blank {
                errors.add(attribute, "can't be blank");
            }
            warn!(%record, errors = errors.len(), "Validation failed");
            record.set_errors(errors);
            return Ok(Persisted { record, saved: false });
        }

        record.set_errors(ValidationErrors::new());
        let table = self.tables.entry(model).or_default();
        match position.flatten() {
            Some(index) => {
                table[index] = record.clone();
                info!(%record, "Updated");
            }
            None => {
                record.set_id(self.next_id.to_string());
                self.next_id += 1;
                table.push(record.clone());
                info!(%record, size = table.len(), "Created");
            }
        }
        Ok(Persisted { record, saved: true })
    }

    fn destroy(&mut self, record: Record) -> Persisted {
        let table = self.tables.entry(record.model_name().to_string()).or_default();
        let before = table.len();
        table.retain(|r| r.id().is_none() || r.id() != record.id());
        let saved = table.len() < before;
        if saved {
            info!(%record, size = table.len(), "Deleted");
        } else {
            warn!(%record, "Not found");
        }
        Persisted { record, saved }
    }
}
