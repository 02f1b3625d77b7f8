//! # Subsystem Wiring
//!
//! Builds the node: one event bus, one storage backend behind the
//! projection cache, the mempool with its content handlers, the block
//! assembler, the scheduler, the indexer with its strategies, and the
//! reaction subsystem. All registration happens here, at startup.

use crate::config::NodeConfig;
use async_trait::async_trait;
use hn_block_production::{
    BlockAssembler, IntervalTicker, PendingSource, ProductionScheduler, SchedulerConfig,
};
use hn_block_storage::{
    warm_chain_state_cache, AssemblerConfig, BlockAssemblerService, ChainStateCache,
    PendingRemover,
};
use hn_credentials::ProducerIdentity;
use hn_indexing::{builtin_registry, IndexerSubscriber, TransactionIndexer};
use hn_mempool::{HandlerContext, HandlerRegistry, Mempool, MempoolConfig};
use hn_reactions::{
    MembershipConfig, MembershipRegistrationStrategy, MembershipService, ReactionVoteHandler,
    ReactionVoteStrategy, TallyService, VerifierRegistry,
};
use hn_storage::{CachedStorage, MemoryStorage, ReadScope as _, SharedStorage};
use shared_bus::{
    spawn_subscriber, EventFilter, EventSubscriber, EventTopic, InMemoryEventBus, NodeEvent,
};
use shared_types::payload::KIND_REACTION_VOTE;
use shared_types::DomainError;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// A fully wired node.
pub struct Node {
    pub config: NodeConfig,
    pub bus: Arc<InMemoryEventBus>,
    pub storage: SharedStorage,
    pub mempool: Arc<Mempool>,
    pub assembler: Arc<BlockAssemblerService>,
    pub scheduler: Arc<ProductionScheduler>,
    pub indexer: Arc<TransactionIndexer>,
    pub membership: Arc<MembershipService>,
    pub tally: Arc<TallyService>,
    shutdown_tx: watch::Sender<bool>,
    tasks: Vec<JoinHandle<()>>,
}

/// Invalidates projection caches after every indexed block.
struct CacheInvalidator {
    cached: Arc<CachedStorage>,
}

#[async_trait]
impl EventSubscriber for CacheInvalidator {
    fn name(&self) -> &'static str {
        "cache-invalidator"
    }

    fn filter(&self) -> EventFilter {
        EventFilter::topics(vec![EventTopic::Indexing])
    }

    async fn handle(&self, event: NodeEvent) -> Result<(), DomainError> {
        if matches!(event, NodeEvent::BlockIndexingCompleted { .. }) {
            self.cached.invalidate_projections();
        }
        Ok(())
    }
}

/// Build every subsystem and register handlers, strategies, and
/// subscribers. Verifying keys arrive from the credential loader, so the
/// verifier registry is injected.
pub async fn build_node(config: NodeConfig, verifier: VerifierRegistry) -> anyhow::Result<Node> {
    let bus = Arc::new(InMemoryEventBus::new());
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // Storage: the embedded driver is an external collaborator; this
    // build wires the in-memory reference adapter.
    let inner: SharedStorage = match config.storage.connection_string.as_str() {
        "memory:" => MemoryStorage::shared(),
        other => anyhow::bail!("unsupported storage connection string: {other}"),
    };
    let cached = Arc::new(CachedStorage::new(inner));
    let storage: SharedStorage = Arc::clone(&cached) as SharedStorage;

    let producer = Arc::new(ProducerIdentity::from_secret_hex(
        &config.producer_secret()?,
    )?);
    info!(producer = %producer.address(), "Producer identity loaded");

    // Reaction subsystem.
    let membership = Arc::new(MembershipService::new(
        MembershipConfig {
            depth: config.reactions.merkle_depth,
            grace_window: config.reactions.grace_window,
        },
        Arc::clone(&storage),
    ));
    let tally = Arc::new(TallyService::new(Arc::clone(&storage), Arc::clone(&bus)));
    let verifier = Arc::new(verifier);

    // Mempool with every content handler.
    let ctx = HandlerContext {
        storage: Arc::clone(&storage),
        producer: Arc::clone(&producer),
    };
    let mut handlers = HandlerRegistry::with_builtin_handlers(&ctx);
    handlers.register(
        KIND_REACTION_VOTE,
        Arc::new(ReactionVoteHandler::new(
            ctx,
            Arc::clone(&membership),
            Arc::clone(&verifier),
        )),
    );
    let mempool = Arc::new(Mempool::new(
        MempoolConfig {
            max_block_size: config.blockchain_settings.max_block_size,
            ..MempoolConfig::default()
        },
        handlers,
        Arc::clone(&bus),
        shutdown_rx.clone(),
    ));

    // Assembler and chain state.
    let chain_cache = Arc::new(ChainStateCache::new());
    warm_chain_state_cache(&storage, &chain_cache).await?;
    let assembler = Arc::new(BlockAssemblerService::new(
        AssemblerConfig::default(),
        Arc::clone(&storage),
        Arc::clone(&chain_cache),
        Arc::clone(&producer),
        Arc::clone(&mempool) as Arc<dyn PendingRemover>,
        Arc::clone(&bus),
    ));

    // Indexer with built-in and reaction strategies.
    let mut strategies = builtin_registry(&storage, &bus);
    strategies.register(Arc::new(MembershipRegistrationStrategy::new(Arc::clone(
        &membership,
    ))));
    strategies.register(Arc::new(ReactionVoteStrategy::new(Arc::clone(&tally))));
    let indexer = Arc::new(TransactionIndexer::new(
        Arc::clone(&storage),
        strategies,
        Arc::clone(&bus),
    ));

    // Scheduler.
    let scheduler = Arc::new(ProductionScheduler::new(
        SchedulerConfig {
            tick_interval: Duration::from_secs(config.blockchain_settings.block_interval_secs),
            max_empty_blocks_before_pause: config
                .blockchain_settings
                .max_empty_blocks_before_pause,
        },
        Arc::clone(&mempool) as Arc<dyn PendingSource>,
        Arc::clone(&assembler) as Arc<dyn BlockAssembler>,
        Arc::clone(&bus),
        shutdown_rx,
    ));

    // Subscribers: indexing and cache invalidation.
    let mut tasks = Vec::new();
    tasks.push(spawn_subscriber(
        &bus,
        Arc::new(IndexerSubscriber::new(Arc::clone(&indexer))),
    ));
    tasks.push(spawn_subscriber(
        &bus,
        Arc::new(CacheInvalidator {
            cached: Arc::clone(&cached),
        }),
    ));

    Ok(Node {
        config,
        bus,
        storage,
        mempool,
        assembler,
        scheduler,
        indexer,
        membership,
        tally,
        shutdown_tx,
        tasks,
    })
}

impl Node {
    /// Bootstrap the chain if storage is empty, then start the production
    /// loop on the wall-clock ticker.
    pub async fn start(&mut self) -> anyhow::Result<()> {
        let read = self.storage.read().await?;
        let needs_genesis = read.chain_state().await?.is_none();
        drop(read);
        if needs_genesis {
            info!("Empty storage, assembling genesis block");
            self.assembler.assemble(Vec::new()).await?;
        }

        let ticker = IntervalTicker::new(Duration::from_secs(
            self.config.blockchain_settings.block_interval_secs,
        ));
        let scheduler = Arc::clone(&self.scheduler);
        self.tasks.push(tokio::spawn(async move {
            scheduler.run(Box::new(ticker)).await;
        }));
        info!(
            rpc_port = self.config.network.rpc_port,
            web_port = self.config.network.web_port,
            "Node started"
        );
        Ok(())
    }

    /// Graceful shutdown: stop pulses, refuse new submissions, let
    /// in-flight work drain.
    pub async fn shutdown(mut self) {
        info!("Shutting down");
        if self.shutdown_tx.send(true).is_err() {
            warn!("Shutdown signal had no receivers");
        }
        for task in self.tasks.drain(..) {
            task.abort();
        }
    }
}
