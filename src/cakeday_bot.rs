use std::{collections::HashMap, path::PathBuf, sync::Arc};

use serenity::prelude::GatewayIntents;
use tokio::fs;
use tracing::{debug, info, warn};

use crate::{
    commands::get_commands,
    cron::birthday_ticker,
    persistence::SaveManager,
    structs::{ApplicationState, Data, GuildData},
};

pub async fn start_bot(
    token: String,
    intents: GatewayIntents,
    save_location: PathBuf,
) -> Result<(), serenity::Error> {
    let snapshot = match fs::read_to_string(save_location.clone()).await {
        Ok(loaded) => match serde_json::from_str::<HashMap<u64, GuildData>>(&loaded) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!("could not parse save file, starting fresh: {e}");
                HashMap::new()
            }
        },
        Err(_) => HashMap::new(),
    };

    let application_state = Arc::new(ApplicationState::from_snapshot(snapshot));

    let saver = Arc::new(SaveManager::new(
        Arc::clone(&application_state),
        save_location,
    ));

    let cron_data = Data {
        state: Arc::clone(&application_state),
        saver: Arc::clone(&saver),
    };

    let framework_builder = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: get_commands(),
            pre_command: |ctx| {
                Box::pin(async move {
                    debug!("executing command /{}...", ctx.invoked_command_name());
                })
            },
            post_command: |ctx| {
                Box::pin(async move {
                    debug!("finished executing command /{}", ctx.invoked_command_name());
                })
            },
            ..Default::default()
        })
        .token(token)
        .intents(intents)
        .setup(|ctx, _ready, framework| {
            Box::pin(async move {
                poise::builtins::register_globally(ctx, &framework.options().commands).await?;
                Ok(Data {
                    state: application_state,
                    saver,
                })
            })
        });

    let framework = framework_builder.build().await?;

    let http_cache = Arc::clone(&framework.client().cache_and_http);

    tokio::spawn(birthday_ticker(http_cache, cron_data));

    info!("starting bot");
    framework.start().await
}
