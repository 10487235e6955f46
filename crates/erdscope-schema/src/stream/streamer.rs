//! Schema streamer
//!
//! Walks a schema (or the neighbourhood of one table) through the host's
//! [`MetadataProvider`], one table at a time, and hands the discovered
//! structures out in batches.

use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use erdscope_core::{
    Column, ColumnReference, ColumnStructure, ErdError, MetadataProvider, Result,
    SchemaEntityStructure, StructuralModel, TableEntity, TableEntityStructure, TableKey,
    is_system_schema,
};
use futures::Stream;
use parking_lot::RwLock;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use super::batch::{PendingBatch, StreamBatch, StreamStats};
use super::options::{StreamMode, StreamOptions};

/// Structural model shared between the streamer and its streams
pub type SharedStructuralModel = Arc<RwLock<StructuralModel>>;

/// Entry point of the schema streaming engine
pub struct SchemaStreamer {
    provider: Arc<dyn MetadataProvider>,
    model: SharedStructuralModel,
    streaming: Arc<AtomicBool>,
    progress: Arc<watch::Sender<f64>>,
}

impl SchemaStreamer {
    pub fn new(provider: Arc<dyn MetadataProvider>) -> Self {
        Self::with_model(provider, Arc::new(RwLock::new(StructuralModel::new())))
    }

    /// Create a streamer that records into an existing model
    pub fn with_model(provider: Arc<dyn MetadataProvider>, model: SharedStructuralModel) -> Self {
        let (progress, _) = watch::channel(0.0);
        Self {
            provider,
            model,
            streaming: Arc::new(AtomicBool::new(false)),
            progress: Arc::new(progress),
        }
    }

    /// Start a new stream. Nothing is fetched until the first pull.
    pub fn stream(&self, options: StreamOptions) -> SchemaStream {
        SchemaStream {
            provider: self.provider.clone(),
            model: self.model.clone(),
            streaming: self.streaming.clone(),
            progress: self.progress.clone(),
            options,
            state: StreamState::NotStarted,
            pending: PendingBatch::default(),
            emitted_schemas: HashSet::new(),
            emitted_keys: HashSet::new(),
            stats: StreamStats::default(),
            guard: None,
        }
    }

    /// Whether a stream is currently in flight
    pub fn is_streaming(&self) -> bool {
        self.streaming.load(Ordering::Acquire)
    }

    /// Fraction of the current (or last) stream that has completed
    pub fn progress(&self) -> f64 {
        *self.progress.borrow()
    }

    /// Observe progress updates
    pub fn subscribe_progress(&self) -> watch::Receiver<f64> {
        self.progress.subscribe()
    }

    /// Shared handle to the structural model
    pub fn shared_model(&self) -> SharedStructuralModel {
        self.model.clone()
    }

    /// Snapshot of the structural model
    pub fn model(&self) -> StructuralModel {
        self.model.read().clone()
    }

    pub fn find_column(&self, column: &Column) -> Option<ColumnStructure> {
        self.model.read().find_column(column).cloned()
    }

    pub fn table(&self, entity: &TableEntity) -> Option<TableEntityStructure> {
        self.model.read().table(entity).cloned()
    }

    pub fn schema(&self, name: &str) -> Option<SchemaEntityStructure> {
        self.model.read().schema(name).cloned()
    }

    /// Forget everything discovered so far
    pub fn reset(&self) {
        self.model.write().clear();
        self.progress.send_replace(0.0);
    }

    /// Schemas of the connected database, without its system schemas
    pub async fn user_schemas(&self) -> Result<Vec<String>> {
        let schemas = self.provider.list_schemas().await?;
        let Some(database) = self.provider.database_type() else {
            return Ok(schemas);
        };
        Ok(schemas
            .into_iter()
            .filter(|schema| !is_system_schema(database, schema))
            .collect())
    }
}

/// Clears the streaming flag when the stream ends or is dropped
struct StreamingGuard {
    flag: Arc<AtomicBool>,
}

impl StreamingGuard {
    fn acquire(flag: &Arc<AtomicBool>) -> Result<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| ErdError::StreamInProgress)?;
        Ok(Self { flag: flag.clone() })
    }
}

impl Drop for StreamingGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

enum StreamState {
    NotStarted,
    Walking {
        tables: Vec<TableEntity>,
        cursor: usize,
    },
    Finished,
}

enum Step {
    Start,
    Table {
        table: TableEntity,
        index: usize,
        total: usize,
    },
    Flush,
}

/// A single, non-restartable pass over a schema or table neighbourhood
pub struct SchemaStream {
    provider: Arc<dyn MetadataProvider>,
    model: SharedStructuralModel,
    streaming: Arc<AtomicBool>,
    progress: Arc<watch::Sender<f64>>,
    options: StreamOptions,
    state: StreamState,
    pending: PendingBatch,
    emitted_schemas: HashSet<String>,
    emitted_keys: HashSet<String>,
    stats: StreamStats,
    guard: Option<StreamingGuard>,
}

impl SchemaStream {
    /// Pull the next batch.
    ///
    /// Returns `None` once the walk is complete. After an error the stream
    /// is finished and every later pull returns `None`.
    #[tracing::instrument(
        name = "schema_stream",
        skip(self),
        fields(mode = self.options.mode.name(), target = %self.options.mode.target())
    )]
    pub async fn next_batch(&mut self) -> Option<Result<StreamBatch>> {
        match self.advance().await {
            Ok(Some(batch)) => {
                self.stats.batches_yielded += 1;
                tracing::debug!(
                    entities = batch.entities.len(),
                    keys = batch.keys.len(),
                    "schema batch ready"
                );
                Some(Ok(batch))
            }
            Ok(None) => {
                self.finish();
                None
            }
            Err(err) => {
                if err.is_aborted() {
                    tracing::info!("schema stream aborted");
                } else {
                    tracing::error!(error = %err, "schema stream failed");
                }
                self.finish();
                Some(Err(err))
            }
        }
    }

    /// Adapt into a [`futures::Stream`]
    pub fn into_stream(self) -> impl Stream<Item = Result<StreamBatch>> + Send {
        futures::stream::unfold(self, |mut stream| async move {
            stream.next_batch().await.map(|item| (item, stream))
        })
    }

    pub fn stats(&self) -> StreamStats {
        self.stats
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.state, StreamState::Finished)
    }

    async fn advance(&mut self) -> Result<Option<StreamBatch>> {
        loop {
            let step = match &mut self.state {
                StreamState::Finished => return Ok(None),
                StreamState::NotStarted => Step::Start,
                StreamState::Walking { tables, cursor } => match tables.get(*cursor).cloned() {
                    Some(table) => {
                        let index = *cursor;
                        *cursor += 1;
                        Step::Table {
                            table,
                            index,
                            total: tables.len(),
                        }
                    }
                    None => Step::Flush,
                },
            };

            match step {
                Step::Start => self.start().await?,
                Step::Table {
                    table,
                    index,
                    total,
                } => {
                    self.check_cancelled()?;
                    self.walk_root(&table, index, total).await?;
                    if self.pending.len() >= self.options.min_batch_size {
                        return Ok(Some(self.take_batch()));
                    }
                }
                Step::Flush => {
                    self.state = StreamState::Finished;
                    self.progress.send_replace(1.0);
                    if self.pending.is_empty() {
                        return Ok(None);
                    }
                    return Ok(Some(self.take_batch()));
                }
            }
        }
    }

    async fn start(&mut self) -> Result<()> {
        self.check_cancelled()?;
        self.guard = Some(StreamingGuard::acquire(&self.streaming)?);
        self.progress.send_replace(0.0);

        let provider = self.provider.clone();
        let tables = match self.options.mode.clone() {
            StreamMode::Schema { schema } => {
                let schema = match schema {
                    Some(schema) => schema,
                    None => self.guarded(provider.get_default_schema()).await?,
                };
                let schema = Some(schema.as_str()).filter(|s| !s.is_empty());
                tracing::info!(schema = ?schema, "streaming schema");
                self.guarded(provider.list_tables(schema)).await?
            }
            StreamMode::Table { table, depth } => {
                if depth > 1 {
                    tracing::warn!(depth, "only direct neighbours are streamed, using depth 1");
                }
                tracing::info!(table = %table, depth, "streaming table");
                vec![table]
            }
        };

        tracing::debug!(count = tables.len(), "tables to discover");
        self.state = StreamState::Walking { tables, cursor: 0 };
        Ok(())
    }

    /// Discover one top-level table and, in table mode, its neighbours.
    ///
    /// In table mode the root's progress slot is split evenly between the
    /// root and its unique neighbours.
    async fn walk_root(&mut self, table: &TableEntity, index: usize, total: usize) -> Result<()> {
        let depth = match &self.options.mode {
            StreamMode::Table { depth, .. } => *depth,
            StreamMode::Schema { .. } => 0,
        };
        if depth == 0 {
            self.discover_table(table, Some((index, total))).await?;
            return Ok(());
        }

        let references = self.discover_table(table, None).await?;
        let mut visited = HashSet::from([table.id()]);
        let neighbours: Vec<TableEntity> = references
            .iter()
            .map(|reference| reference.far_side(table))
            .filter(|neighbour| visited.insert(neighbour.id()))
            .cloned()
            .collect();

        let slots = 1 + neighbours.len();
        let base = index * slots;
        let total = total * slots;
        tracing::debug!(table = %table, neighbours = neighbours.len(), "expanding neighbours");
        self.report(Some((base, total)), 1.0);

        for (offset, neighbour) in neighbours.iter().enumerate() {
            self.check_cancelled()?;
            self.discover_table(neighbour, Some((base + offset + 1, total)))
                .await?;
        }
        Ok(())
    }

    /// Fetch the structure of a single table.
    ///
    /// Returns every reference touching the table, including ones already
    /// emitted earlier in the stream.
    async fn discover_table(
        &mut self,
        entity: &TableEntity,
        position: Option<(usize, usize)>,
    ) -> Result<Vec<ColumnReference>> {
        tracing::debug!(table = %entity, "discovering table");
        let provider = self.provider.clone();
        let schema = entity.schema_name();
        let name = entity.name.as_str();

        if let Some(schema) = schema {
            self.model.write().ensure_schema(schema);
            if self.emitted_schemas.insert(schema.to_string()) {
                self.pending.push_schema(schema);
            }
        }

        let mut structure = TableEntityStructure::new(entity.clone());

        match self.guarded(provider.list_columns(schema, name)).await {
            Ok(columns) => {
                let mut model = self.model.write();
                for info in columns {
                    let mut column = ColumnStructure::new(entity.clone(), info.name);
                    column.data_type = info.data_type;
                    column.ordinal_position = info.ordinal_position;
                    column.nullable = info.nullable;
                    model.register_column(column.clone());
                    structure.columns.push(column);
                }
            }
            Err(err) => self.absorb(entity, "columns", err)?,
        }

        let mut indexed_primary_columns = HashSet::new();
        match self.guarded(provider.list_indexes(schema, name)).await {
            Ok(indexes) => {
                for index in indexes {
                    for indexed in &index.columns {
                        if index.primary {
                            indexed_primary_columns.insert(indexed.name.clone());
                        }
                        if let Some(column) = structure.column_mut(&indexed.name) {
                            column.primary_key |= index.primary;
                            column.unique_key |= index.unique;
                        }
                    }
                }
            }
            Err(err) => self.absorb(entity, "indexes", err)?,
        }

        let mut listed_primary_columns = 0;
        match self.guarded(provider.list_primary_keys(schema, name)).await {
            Ok(primary_keys) => {
                listed_primary_columns = primary_keys.len();
                for key in primary_keys {
                    if let Some(column) = structure.column_mut(&key.name) {
                        column.primary_key = true;
                    }
                }
            }
            Err(err) => self.absorb(entity, "primary keys", err)?,
        }

        structure.is_composite = indexed_primary_columns.len() > 1 || listed_primary_columns > 1;
        self.report(position, 1.0 / 3.0);

        self.check_cancelled()?;
        let mut references = Vec::new();

        match self.guarded(provider.list_incoming_keys(schema, name)).await {
            Ok(keys) => {
                for key in &keys {
                    for (from, to) in key.column_pairs() {
                        if let Some(column) = structure.column_mut(to) {
                            column.has_references = true;
                        }
                        references.push(reference_for(key, from, to));
                    }
                }
            }
            Err(err) => self.absorb(entity, "incoming keys", err)?,
        }

        match self.guarded(provider.list_outgoing_keys(schema, name)).await {
            Ok(keys) => {
                for key in &keys {
                    for (from, to) in key.column_pairs() {
                        if let Some(column) = structure.column_mut(from) {
                            column.has_references = true;
                            column.foreign_key = true;
                        }
                        references.push(reference_for(key, from, to));
                    }
                }
            }
            Err(err) => self.absorb(entity, "outgoing keys", err)?,
        }

        for reference in &references {
            if self.emitted_keys.insert(reference.id()) {
                self.pending.push_key(reference.clone());
            }
        }
        self.report(position, 2.0 / 3.0);

        self.model.write().register_table(structure.clone());
        self.pending.push_table(structure);
        self.stats.tables_discovered += 1;
        self.report(position, 1.0);

        Ok(references)
    }

    /// Await a provider call, abandoning it as soon as the stream is cancelled
    async fn guarded<T>(&self, call: impl Future<Output = Result<T>>) -> Result<T> {
        let signal = &self.options.signal;
        if signal.is_cancelled() {
            return Err(ErdError::Aborted);
        }
        let result = tokio::select! {
            biased;
            _ = signal.cancelled() => return Err(ErdError::Aborted),
            result = call => result,
        };
        self.check_cancelled()?;
        result
    }

    /// Skip a failed per-table call unless the failure ends the stream
    fn absorb(&mut self, entity: &TableEntity, what: &str, err: ErdError) -> Result<()> {
        if err.is_fatal_for_stream() {
            return Err(err);
        }
        tracing::warn!(table = %entity, error = %err, "failed to fetch {what}");
        self.stats.partial_failures += 1;
        Ok(())
    }

    fn check_cancelled(&self) -> Result<()> {
        check_signal(&self.options.signal)
    }

    fn report(&self, position: Option<(usize, usize)>, fraction: f64) {
        if let Some((index, total)) = position {
            let progress = (index as f64 + fraction) / total.max(1) as f64;
            self.progress.send_replace(progress.clamp(0.0, 1.0));
        }
    }

    fn take_batch(&mut self) -> StreamBatch {
        let model = self.model.read();
        self.pending.take(&model)
    }

    fn finish(&mut self) {
        self.state = StreamState::Finished;
        self.guard = None;
    }
}

fn check_signal(signal: &CancellationToken) -> Result<()> {
    if signal.is_cancelled() {
        Err(ErdError::Aborted)
    } else {
        Ok(())
    }
}

fn reference_for(key: &TableKey, from: &str, to: &str) -> ColumnReference {
    ColumnReference::new(key.from_entity().column(from), key.to_entity().column(to))
}
