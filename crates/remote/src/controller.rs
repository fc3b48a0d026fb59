//! Harmony controller: owns the tokens and runs every hub operation as one
//! connect, operate, disconnect cycle.
//!
//! A single mutex guards both the token state and the cycle itself, so at
//! most one hub session is open at a time and a token refresh never runs
//! while an operation is using the token it would replace.

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock, mpsc};
use tracing::{debug, info, warn};

use harmony_hub_connection::SessionError;
use harmony_protocol::constants::POWER_OFF_ACTIVITY_ID;
use harmony_protocol::{ActionDescriptor, HubConfiguration, SessionToken};

use crate::capability::CapabilitySet;
use crate::connector::{HubConnector, HubLink};
use crate::directory::DeviceDirectory;
use crate::entity::{ActivityState, EntityId, EntityKind, PowerState, RemoteState};
use crate::error::HarmonyError;
use crate::intent::RemoteIntent;
use crate::types::{CommandOutcome, HarmonyEvent};

#[derive(Default)]
struct TokenState {
    session: Option<SessionToken>,
}

/// Everything published upward, rebuilt by `initialize`.
#[derive(Default)]
struct Registry {
    directory: DeviceDirectory,
    remotes: BTreeMap<EntityId, RemoteState>,
    activities: BTreeMap<EntityId, ActivityState>,
    current_activity: Option<String>,
}

impl Registry {
    /// Replaces the registry from a fresh configuration. Power and source
    /// state of remotes that survive the rebuild are carried over.
    fn rebuild(&mut self, config: &HubConfiguration, current_activity: &str) -> Vec<(EntityId, EntityKind)> {
        let directory = DeviceDirectory::build(config);
        let mut remotes = BTreeMap::new();
        let mut registered = Vec::new();

        for entry in directory.devices() {
            let entity = EntityId::remote(&entry.label);
            if remotes.contains_key(&entity) {
                warn!(%entity, device_id = %entry.device_id, "duplicate device label, skipping");
                continue;
            }
            let previous = self.remotes.get(&entity);
            remotes.insert(
                entity.clone(),
                RemoteState {
                    entity: entity.clone(),
                    device_id: entry.device_id.clone(),
                    label: entry.label.clone(),
                    power: previous.map_or(PowerState::Unknown, |p| p.power),
                    capabilities: CapabilitySet::for_device(entry),
                    source: previous.and_then(|p| p.source.clone()),
                    source_list: entry.source_list(),
                },
            );
            registered.push((entity, EntityKind::Remote));
        }

        let mut activities = BTreeMap::new();
        for activity in &config.activities {
            if activity.id == POWER_OFF_ACTIVITY_ID {
                continue;
            }
            let entity = EntityId::activity(&activity.label);
            if activities.contains_key(&entity) {
                warn!(%entity, activity_id = %activity.id, "duplicate activity label, skipping");
                continue;
            }
            let power = if activity.id == current_activity {
                PowerState::On
            } else {
                PowerState::Off
            };
            activities.insert(
                entity.clone(),
                ActivityState {
                    entity: entity.clone(),
                    activity_id: activity.id.clone(),
                    label: activity.label.clone(),
                    power,
                },
            );
            registered.push((entity, EntityKind::Activity));
        }

        self.directory = directory;
        self.remotes = remotes;
        self.activities = activities;
        self.current_activity = Some(current_activity.to_string());
        registered
    }

    /// Records `activity_id` as the running activity and returns the
    /// activities whose power state changed.
    fn set_current_activity(&mut self, activity_id: &str) -> Vec<(EntityId, PowerState)> {
        self.current_activity = Some(activity_id.to_string());
        let mut changed = Vec::new();
        for activity in self.activities.values_mut() {
            let power = if activity.activity_id == activity_id {
                PowerState::On
            } else {
                PowerState::Off
            };
            if activity.power != power {
                activity.power = power;
                changed.push((activity.entity.clone(), power));
            }
        }
        changed
    }
}

/// Controller for one Harmony hub.
pub struct HarmonyController {
    connector: Arc<dyn HubConnector>,
    tokens: Mutex<TokenState>,
    registry: RwLock<Registry>,
    events_tx: mpsc::Sender<HarmonyEvent>,
    events_rx: Mutex<Option<mpsc::Receiver<HarmonyEvent>>>,
}

impl HarmonyController {
    pub fn new(connector: Arc<dyn HubConnector>) -> Self {
        let (events_tx, events_rx) = mpsc::channel(64);
        Self {
            connector,
            tokens: Mutex::new(TokenState::default()),
            registry: RwLock::new(Registry::default()),
            events_tx,
            events_rx: Mutex::new(Some(events_rx)),
        }
    }

    /// Takes the event receiver. Returns `None` after the first call.
    pub async fn take_events(&self) -> Option<mpsc::Receiver<HarmonyEvent>> {
        self.events_rx.lock().await.take()
    }

    /// Fetches current activity and configuration, rebuilds the device
    /// directory, and registers every device and activity as an entity.
    pub async fn initialize(&self) -> Result<Vec<EntityId>, HarmonyError> {
        info!("updating Harmony entities");
        let mut tokens = self.tokens.lock().await;
        let link = self.connect(&mut tokens).await?;

        let fetched = async {
            let current = link.get_current_activity().await?;
            let config = link.get_configuration().await?;
            Ok::<_, SessionError>((current, config))
        }
        .await;
        link.close().await;
        drop(tokens);

        let (current, config) = fetched.map_err(HarmonyError::from_request)?;
        let registered = self.registry.write().await.rebuild(&config, &current);

        info!(
            entities = registered.len(),
            current_activity = %current,
            "registered Harmony entities"
        );
        for (entity, kind) in &registered {
            self.emit(HarmonyEvent::Registered {
                entity: entity.clone(),
                kind: *kind,
            });
        }
        Ok(registered.into_iter().map(|(e, _)| e).collect())
    }

    /// Turns an entity on: starts an activity, or presses a device's
    /// `PowerOn` function.
    pub async fn turn_on(&self, entity: &EntityId) -> Result<CommandOutcome, HarmonyError> {
        match entity.kind() {
            EntityKind::Activity => {
                let activity_id = self.activity_id(entity).await?;
                self.start_activity(&activity_id).await?;
                Ok(CommandOutcome::Sent)
            }
            EntityKind::Remote => self.press_power(entity, &RemoteIntent::TurnOn, PowerState::On).await,
        }
    }

    /// Turns an entity off: switches the hub to the power-off activity, or
    /// presses a device's `PowerOff` function.
    pub async fn turn_off(&self, entity: &EntityId) -> Result<CommandOutcome, HarmonyError> {
        match entity.kind() {
            EntityKind::Activity => {
                self.activity_id(entity).await?;
                self.start_activity(POWER_OFF_ACTIVITY_ID).await?;
                Ok(CommandOutcome::Sent)
            }
            EntityKind::Remote => {
                self.press_power(entity, &RemoteIntent::TurnOff, PowerState::Off).await
            }
        }
    }

    /// Turns an entity off when it is on, and on otherwise.
    pub async fn toggle(&self, entity: &EntityId) -> Result<CommandOutcome, HarmonyError> {
        if self.power(entity).await? == PowerState::On {
            self.turn_off(entity).await
        } else {
            self.turn_on(entity).await
        }
    }

    /// Replays an action descriptor on a device entity.
    pub async fn send_command(
        &self,
        entity: &EntityId,
        action: &ActionDescriptor,
    ) -> Result<(), HarmonyError> {
        self.remote(entity)
            .await
            .ok_or_else(|| HarmonyError::UnknownEntity(entity.to_string()))?;
        info!(%entity, command = %action.command, "sending command");

        let mut tokens = self.tokens.lock().await;
        let link = self.connect(&mut tokens).await?;
        let result = link.hold_action(action).await;
        link.close().await;
        result.map_err(HarmonyError::from_request)
    }

    /// Presses a device function by name. A missing function is logged and
    /// reported as [`CommandOutcome::Unsupported`].
    pub async fn press(&self, entity: &EntityId, name: &str) -> Result<CommandOutcome, HarmonyError> {
        let action = {
            let registry = self.registry.read().await;
            let remote = registry
                .remotes
                .get(entity)
                .ok_or_else(|| HarmonyError::UnknownEntity(entity.to_string()))?;
            match registry.directory.resolve_by_name(&remote.device_id, name) {
                Ok(action) => action.clone(),
                Err(e) => {
                    warn!(%entity, "command not supported by this device: {e}");
                    return Ok(CommandOutcome::Unsupported);
                }
            }
        };
        self.send_command(entity, &action).await?;
        Ok(CommandOutcome::Sent)
    }

    /// Presses the device function whose label is `source`.
    pub async fn select_source(
        &self,
        entity: &EntityId,
        source: &str,
    ) -> Result<CommandOutcome, HarmonyError> {
        let action = {
            let registry = self.registry.read().await;
            let remote = registry
                .remotes
                .get(entity)
                .ok_or_else(|| HarmonyError::UnknownEntity(entity.to_string()))?;
            match registry.directory.resolve_by_label(&remote.device_id, source) {
                Ok(action) => action.clone(),
                Err(e) => {
                    warn!(%entity, "source not available on this device: {e}");
                    return Ok(CommandOutcome::Unsupported);
                }
            }
        };
        self.send_command(entity, &action).await?;

        if let Some(remote) = self.registry.write().await.remotes.get_mut(entity) {
            remote.source = Some(source.to_string());
        }
        self.emit(HarmonyEvent::SourceChanged {
            entity: entity.clone(),
            source: source.to_string(),
        });
        Ok(CommandOutcome::Sent)
    }

    /// Applies an intent to each target independently. One failure does
    /// not stop the others.
    pub async fn handle_intent(
        &self,
        targets: &[EntityId],
        intent: &RemoteIntent,
    ) -> Vec<(EntityId, Result<CommandOutcome, HarmonyError>)> {
        let mut results = Vec::with_capacity(targets.len());
        for entity in targets {
            let result = self.apply(entity, intent).await;
            if let Err(e) = &result {
                warn!(%entity, ?intent, "intent failed: {e}");
            }
            results.push((entity.clone(), result));
        }
        results
    }

    async fn apply(&self, entity: &EntityId, intent: &RemoteIntent) -> Result<CommandOutcome, HarmonyError> {
        if let (EntityKind::Remote, Some(capability)) = (entity.kind(), intent.capability()) {
            let remote = self
                .remote(entity)
                .await
                .ok_or_else(|| HarmonyError::UnknownEntity(entity.to_string()))?;
            if !remote.capabilities.contains(capability) {
                debug!(%entity, ?intent, "intent outside the device's capabilities");
                return Ok(CommandOutcome::Unsupported);
            }
        }

        match intent {
            RemoteIntent::TurnOn => self.turn_on(entity).await,
            RemoteIntent::TurnOff => self.turn_off(entity).await,
            RemoteIntent::Toggle => self.toggle(entity).await,
            RemoteIntent::SelectSource(label) if entity.kind() == EntityKind::Remote => {
                self.select_source(entity, label).await
            }
            _ if entity.kind() == EntityKind::Activity => {
                self.activity_id(entity).await?;
                warn!(%entity, ?intent, "activities only support turning on and off");
                Ok(CommandOutcome::Unsupported)
            }
            other => match other.function_name() {
                Some(name) => self.press(entity, name).await,
                None => Ok(CommandOutcome::Unsupported),
            },
        }
    }

    /// Re-derives the session token. On failure the previous token stays
    /// in place for the next operation to use.
    pub async fn refresh_token(&self) -> Result<(), HarmonyError> {
        let mut tokens = self.tokens.lock().await;
        match self.derive(&mut tokens).await {
            Ok(_) => {
                info!("session token refreshed");
                self.emit(HarmonyEvent::TokenRefreshed);
                Ok(())
            }
            Err(e) => {
                warn!("token refresh failed, keeping previous token: {e}");
                self.emit(HarmonyEvent::TokenRefreshFailed {
                    reason: e.to_string(),
                });
                Err(e)
            }
        }
    }

    /// Snapshot of a device entity.
    pub async fn remote(&self, entity: &EntityId) -> Option<RemoteState> {
        self.registry.read().await.remotes.get(entity).cloned()
    }

    /// Snapshot of an activity entity.
    pub async fn activity(&self, entity: &EntityId) -> Option<ActivityState> {
        self.registry.read().await.activities.get(entity).cloned()
    }

    pub async fn remotes(&self) -> Vec<RemoteState> {
        self.registry.read().await.remotes.values().cloned().collect()
    }

    pub async fn activities(&self) -> Vec<ActivityState> {
        self.registry.read().await.activities.values().cloned().collect()
    }

    /// Id of the running activity as last observed.
    pub async fn current_activity(&self) -> Option<String> {
        self.registry.read().await.current_activity.clone()
    }

    /// Opens a session, deriving a token first if none exists. When the
    /// open fails a new token is derived and the open retried exactly once.
    /// If that derivation fails too, the retry reuses the previous token,
    /// which stays in place.
    async fn connect(&self, tokens: &mut TokenState) -> Result<Box<dyn HubLink>, HarmonyError> {
        let token = match tokens.session.clone() {
            Some(token) => token,
            None => self.derive(tokens).await?,
        };

        match self.connector.open_session(&token).await {
            Ok(link) => return Ok(link),
            Err(e) => warn!("could not connect to Harmony, retrying with a new token: {e}"),
        }

        let token = match self.derive(tokens).await {
            Ok(fresh) => fresh,
            Err(e) => {
                warn!("could not derive a new token, retrying with the previous one: {e}");
                token
            }
        };
        self.connector
            .open_session(&token)
            .await
            .map_err(HarmonyError::Connection)
    }

    /// Derives a session token. `tokens` is only updated on success.
    async fn derive(&self, tokens: &mut TokenState) -> Result<SessionToken, HarmonyError> {
        let login = self.connector.exchange_credentials().await?;
        let session = self.connector.swap_token(&login).await?;
        debug!(token = ?session, "derived session token");
        tokens.session = Some(session.clone());
        Ok(session)
    }

    async fn start_activity(&self, activity_id: &str) -> Result<(), HarmonyError> {
        let mut tokens = self.tokens.lock().await;
        let link = self.connect(&mut tokens).await?;
        let result = link.start_activity(activity_id).await;
        link.close().await;
        drop(tokens);
        result.map_err(HarmonyError::from_request)?;

        info!(%activity_id, "activity started");
        let changed = self.registry.write().await.set_current_activity(activity_id);
        for (entity, power) in changed {
            self.emit(HarmonyEvent::PowerChanged { entity, power });
        }
        Ok(())
    }

    async fn press_power(
        &self,
        entity: &EntityId,
        intent: &RemoteIntent,
        power: PowerState,
    ) -> Result<CommandOutcome, HarmonyError> {
        let Some(name) = intent.function_name() else {
            return Ok(CommandOutcome::Unsupported);
        };
        let outcome = self.press(entity, name).await?;
        if outcome == CommandOutcome::Sent {
            if let Some(remote) = self.registry.write().await.remotes.get_mut(entity) {
                remote.power = power;
            }
            self.emit(HarmonyEvent::PowerChanged {
                entity: entity.clone(),
                power,
            });
        }
        Ok(outcome)
    }

    async fn activity_id(&self, entity: &EntityId) -> Result<String, HarmonyError> {
        self.registry
            .read()
            .await
            .activities
            .get(entity)
            .map(|a| a.activity_id.clone())
            .ok_or_else(|| HarmonyError::UnknownEntity(entity.to_string()))
    }

    async fn power(&self, entity: &EntityId) -> Result<PowerState, HarmonyError> {
        let registry = self.registry.read().await;
        let power = match entity.kind() {
            EntityKind::Activity => registry.activities.get(entity).map(|a| a.power),
            EntityKind::Remote => registry.remotes.get(entity).map(|r| r.power),
        };
        power.ok_or_else(|| HarmonyError::UnknownEntity(entity.to_string()))
    }

    fn emit(&self, event: HarmonyEvent) {
        if self.events_tx.try_send(event).is_err() {
            debug!("event channel full or closed, dropping event");
        }
    }
}
