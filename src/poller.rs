use crate::error::ExplorerResult;
use crate::explorer::ChainExplorer;
use crate::models::NetworkOverview;
use crate::rpc::ChainRpc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, info, warn};

/// Receiving end of a running overview poller. Dropping it stops the poller.
pub struct OverviewFeed {
    pub updates: mpsc::Receiver<ExplorerResult<NetworkOverview>>,
    pub handle: JoinHandle<()>,
}

/// Loads the network overview immediately and then once per `every`, until
/// the returned feed is dropped.
pub fn spawn_overview_poller<R>(explorer: Arc<ChainExplorer<R>>, every: Duration) -> OverviewFeed
where
    R: ChainRpc + 'static,
{
    let (tx, updates) = mpsc::channel(1);
    let every = every.max(Duration::from_millis(1));

    let handle = tokio::spawn(async move {
        info!("Polling network overview every {:?}", every);
        let mut ticker = interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = tx.closed() => break,
            }

            let overview = explorer.network_overview().await;
            match &overview {
                Ok(o) => debug!("Overview refreshed at block {}", o.latest_block.number),
                Err(e) => warn!("Overview refresh failed: {}", e),
            }

            if tx.send(overview).await.is_err() {
                break;
            }
        }

        debug!("Overview consumer gone, poller stopped");
    });

    OverviewFeed { updates, handle }
}
