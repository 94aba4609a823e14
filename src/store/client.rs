use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, instrument};

use crate::framework::error::StoreError;
use crate::framework::model::{Attributes, Loader, Mutator};
use crate::framework::record::Record;
use crate::store::actor::{Persisted, Response, StoreRequest};

/// Client for the memory store actor. Cheap to clone; every clone talks to the same actor.
#[derive(Clone)]
pub struct StoreClient {
    sender: mpsc::Sender<StoreRequest>,
}

impl StoreClient {
    pub fn new(sender: mpsc::Sender<StoreRequest>) -> Self {
        Self { sender }
    }

    async fn request<T>(&self, message: impl FnOnce(Response<T>) -> StoreRequest) -> Result<T, StoreError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(message(respond_to))
            .await
            .map_err(|_| StoreError::ActorClosed)?;
        response.await.map_err(|_| StoreError::ActorDropped)?
    }

    async fn persist(
        &self,
        record: &mut Record,
        message: impl FnOnce(Record, Response<Persisted>) -> StoreRequest,
    ) -> Result<bool, StoreError> {
        let sent = record.clone();
        let persisted = self.request(|respond_to| message(sent, respond_to)).await?;
        *record = persisted.record;
        Ok(persisted.saved)
    }

    /// Saves a new top-level record, for seeding.
    #[instrument(skip(self))]
    pub async fn insert(&self, model: &str, attrs: Attributes) -> Result<Record, StoreError> {
        debug!("Sending request");
        let mut record = Record::unsaved(model, attrs);
        if self.save(&mut record).await? {
            Ok(record)
        } else {
            Err(StoreError::Backend(format!("{} rejected: {:?}", model, record)))
        }
    }

    /// Saves a new record under `parent` through its `accessor`, for seeding.
    #[instrument(skip(self, parent), fields(parent = %parent))]
    pub async fn insert_child(
        &self,
        parent: &Record,
        accessor: &str,
        attrs: Attributes,
    ) -> Result<Record, StoreError> {
        debug!("Sending request");
        let mut record = self.build_child(parent, accessor, attrs).await?;
        if self.save(&mut record).await? {
            Ok(record)
        } else {
            Err(StoreError::Backend(format!("{} rejected: {:?}", accessor, record)))
        }
    }
}

#[async_trait]
impl Loader for StoreClient {
    type Record = Record;

    #[instrument(skip(self))]
    async fn load_by_id(&self, model: &str, id: &str) -> Result<Option<Record>, StoreError> {
        debug!("Sending request");
        self.request(|respond_to| StoreRequest::Find {
            model: model.to_string(),
            id: id.to_string(),
            respond_to,
        })
        .await
    }

    #[instrument(skip(self, parent), fields(parent = %parent))]
    async fn find_child(&self, parent: &Record, accessor: &str, id: &str) -> Result<Option<Record>, StoreError> {
        debug!("Sending request");
        self.request(|respond_to| StoreRequest::FindChild {
            parent: parent.clone(),
            accessor: accessor.to_string(),
            id: id.to_string(),
            respond_to,
        })
        .await
    }

    #[instrument(skip(self, parent), fields(parent = %parent))]
    async fn list_children(&self, parent: &Record, accessor: &str) -> Result<Vec<Record>, StoreError> {
        debug!("Sending request");
        self.request(|respond_to| StoreRequest::Children {
            parent: parent.clone(),
            accessor: accessor.to_string(),
            respond_to,
        })
        .await
    }

    #[instrument(skip(self, parent, attrs), fields(parent = %parent))]
    async fn build_child(&self, parent: &Record, accessor: &str, attrs: Attributes) -> Result<Record, StoreError> {
        debug!(?attrs, "Sending request");
        self.request(|respond_to| StoreRequest::BuildChild {
            parent: parent.clone(),
            accessor: accessor.to_string(),
            attrs,
            respond_to,
        })
        .await
    }

    #[instrument(skip(self, parent), fields(parent = %parent))]
    async fn singleton_child(&self, parent: &Record, accessor: &str) -> Result<Option<Record>, StoreError> {
        debug!("Sending request");
        self.request(|respond_to| StoreRequest::SingletonChild {
            parent: parent.clone(),
            accessor: accessor.to_string(),
            respond_to,
        })
        .await
    }

    #[instrument(skip(self, parent, attrs), fields(parent = %parent))]
    async fn build_singleton_child(
        &self,
        parent: &Record,
        accessor: &str,
        attrs: Attributes,
    ) -> Result<Record, StoreError> {
        debug!(?attrs, "Sending request");
        self.request(|respond_to| StoreRequest::BuildSingletonChild {
            parent: parent.clone(),
            accessor: accessor.to_string(),
            attrs,
            respond_to,
        })
        .await
    }

    #[instrument(skip(self, record), fields(record = %record))]
    async fn owner(&self, record: &Record, association: &str) -> Result<Option<Record>, StoreError> {
        debug!("Sending request");
        self.request(|respond_to| StoreRequest::Owner {
            record: record.clone(),
            association: association.to_string(),
            respond_to,
        })
        .await
    }

    #[instrument(skip(self))]
    async fn list_top_level(&self, model: &str) -> Result<Vec<Record>, StoreError> {
        debug!("Sending request");
        self.request(|respond_to| StoreRequest::All {
            model: model.to_string(),
            respond_to,
        })
        .await
    }

    async fn find_top_level(&self, model: &str, id: &str) -> Result<Option<Record>, StoreError> {
        self.load_by_id(model, id).await
    }

    async fn build_top_level(&self, model: &str, attrs: Attributes) -> Result<Record, StoreError> {
        Ok(Record::unsaved(model, attrs))
    }
}

#[async_trait]
impl Mutator for StoreClient {
    #[instrument(skip(self, record), fields(record = %record))]
    async fn save(&self, record: &mut Record) -> Result<bool, StoreError> {
        debug!("Sending request");
        self.persist(record, |record, respond_to| StoreRequest::Save { record, respond_to })
            .await
    }

    #[instrument(skip(self, record, attrs), fields(record = %record))]
    async fn update(&self, record: &mut Record, attrs: Attributes) -> Result<bool, StoreError> {
        debug!(?attrs, "Sending request");
        self.persist(record, |record, respond_to| StoreRequest::Update {
            record,
            attrs,
            respond_to,
        })
        .await
    }

    #[instrument(skip(self, record), fields(record = %record))]
    async fn destroy(&self, record: &mut Record) -> Result<bool, StoreError> {
        debug!("Sending request");
        self.persist(record, |record, respond_to| StoreRequest::Destroy { record, respond_to })
            .await
    }
}
