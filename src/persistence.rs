use std::{path::PathBuf, sync::Arc};

use tokio::{
    fs,
    sync::watch::{self, Receiver, Sender},
};
use tracing::error;

use crate::structs::ApplicationState;

// Saving only, load is handled by app root
pub struct SaveManager {
    watch_sender: Sender<()>,
}

impl SaveManager {
    pub fn new(state: Arc<ApplicationState>, location: PathBuf) -> Self {
        let (send, recv) = watch::channel(());
        tokio::spawn(saver(recv, location, state));

        Self { watch_sender: send }
    }

    /// Request a save. Writes are coalesced, the saver task picks up the
    /// latest state whenever it wakes.
    pub fn save(&self) {
        let _ = self.watch_sender.send(());
    }
}

async fn saver(
    mut recv: Receiver<()>,
    location: PathBuf,
    state: Arc<ApplicationState>,
) -> anyhow::Result<()> {
    loop {
        recv.changed().await?;

        let snapshot = state.snapshot().await;

        let serialized = match serde_json::to_string_pretty(&snapshot) {
            Ok(serialized) => serialized,
            Err(e) => {
                error!("could not serialize application state for saving: {e}");
                continue;
            }
        };

        if let Err(e) = fs::write(location.clone(), serialized).await {
            error!("could not save application state: {e}");
        }
    }
}
