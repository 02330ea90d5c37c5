use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use battleground_server::battleground::Battleground;
use battleground_server::config::{load_options, BattlegroundEngineOptions};
use battleground_server::constants::TICK_MS;
use battleground_server::effects::{dispatch_effects, EffectSink};
use battleground_server::engine::BattlegroundEngine;
use battleground_server::presentation::WorldStateTable;
use battleground_server::server_protocol::{parse_client_message, ParsedClientMessage};
use battleground_server::server_utils::{
    balance_team, is_holiday_weekend, parse_leaderboard_limit, player_order_key, sanitize_name,
};
use battleground_server::stats_store::StatsStore;
use battleground_server::types::{
    ChatChannel, ChatMessage, MatchPlayer, NodeId, NodeStatus, Notice, SoundCue, Team,
    WorldStateUpdate,
};
use chrono::Utc;
use futures_util::{SinkExt, StreamExt};
use rand::distr::Alphanumeric;
use rand::Rng;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::{mpsc, Mutex};
use tower_http::services::{ServeDir, ServeFile};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

type SharedState = Arc<Mutex<ServerState>>;

#[derive(Clone, Debug)]
struct LobbyPlayerInternal {
    id: String,
    name: String,
    team: Team,
    connected: bool,
    reconnect_token: String,
}

#[derive(Clone)]
struct ClientContext {
    tx: mpsc::Sender<OutboundMessage>,
    player_id: Option<String>,
}

#[derive(Clone, Debug)]
enum OutboundMessage {
    Text(String),
    Close { code: u16, reason: String },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum QueuePolicy {
    DropOnFull,
    DisconnectOnFull,
}

#[derive(Clone, Debug)]
enum Audience {
    All,
    Team(Team),
    Player(String),
}

struct ServerState {
    clients: HashMap<String, ClientContext>,
    lobby_players: HashMap<String, LobbyPlayerInternal>,
    active_client_by_player_id: HashMap<String, String>,
    host_id: Option<String>,
    battleground: Option<Box<dyn Battleground + Send>>,
    world_states: WorldStateTable,
    options: BattlegroundEngineOptions,
    stats_store: StatsStore,
}

impl ServerState {
    fn new(options: BattlegroundEngineOptions, stats_store: StatsStore) -> Self {
        Self {
            clients: HashMap::new(),
            lobby_players: HashMap::new(),
            active_client_by_player_id: HashMap::new(),
            host_id: None,
            battleground: None,
            world_states: WorldStateTable::default(),
            options,
            stats_store,
        }
    }
}

/// Collects what the engine asked for this tick as addressed client messages.
#[derive(Default)]
struct ServerSink {
    world_states: Vec<WorldStateUpdate>,
    outbox: Vec<(Audience, Value)>,
    departures: Vec<String>,
}

impl EffectSink for ServerSink {
    fn update_world_state(&mut self, update: WorldStateUpdate) {
        self.world_states.push(update);
    }

    fn send_chat(&mut self, channel: ChatChannel, message: &ChatMessage) {
        let audience = match channel {
            ChatChannel::Alliance => Audience::Team(Team::Alliance),
            ChatChannel::Horde => Audience::Team(Team::Horde),
            ChatChannel::Neutral => Audience::All,
        };
        self.outbox.push((
            audience,
            json!({ "type": "chat", "channel": channel, "message": message }),
        ));
    }

    fn play_sound(&mut self, cue: SoundCue) {
        self.outbox.push((
            Audience::All,
            json!({ "type": "sound", "soundId": cue.sound_id(), "cue": cue }),
        ));
    }

    fn spawn_banner(&mut self, node: NodeId, status: NodeStatus) {
        self.outbox.push((
            Audience::All,
            json!({ "type": "banner", "node": node, "status": status }),
        ));
    }

    fn enter_pvp_combat(&mut self, player_id: &str) {
        self.outbox.push((
            Audience::Player(player_id.to_string()),
            json!({ "type": "pvp_combat" }),
        ));
    }

    fn cast_team_reward(&mut self, team: Team, spell_id: u32) {
        log::info!("casting team reward {spell_id} on {team:?}");
        self.outbox.push((
            Audience::Team(team),
            json!({ "type": "team_reward", "spellId": spell_id }),
        ));
    }

    fn reward_honor(&mut self, team: Team, amount: u32) {
        self.outbox.push((
            Audience::Team(team),
            json!({ "type": "reward", "kind": "honor", "amount": amount }),
        ));
    }

    fn reward_reputation(&mut self, team: Team, faction_id: u32, amount: u32) {
        self.outbox.push((
            Audience::Team(team),
            json!({
                "type": "reward",
                "kind": "reputation",
                "factionId": faction_id,
                "amount": amount,
            }),
        ));
    }

    fn notify(&mut self, player_id: &str, notice: Notice) {
        self.outbox.push((
            Audience::Player(player_id.to_string()),
            json!({ "type": "notice", "notice": notice }),
        ));
    }

    fn leave_battleground(&mut self, player_id: &str) {
        self.departures.push(player_id.to_string());
    }

    fn match_ended(&mut self, winner: Option<Team>) {
        self.outbox.push((
            Audience::All,
            json!({ "type": "match_ended", "winner": winner }),
        ));
    }
}

#[derive(Debug, Deserialize)]
struct LeaderboardQuery {
    limit: Option<String>,
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let port = std::env::var("PORT")
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8080);

    let options = match std::env::var("BATTLEGROUND_CONFIG") {
        Ok(path) => match load_options(&PathBuf::from(path)) {
            Ok(options) => options,
            Err(error) => {
                log::error!("{error}");
                std::process::exit(1);
            }
        },
        Err(_) => BattlegroundEngineOptions::default(),
    };

    let stats_path = std::env::var("STATS_DB_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(".data/battleground-stats.json"));

    let state = Arc::new(Mutex::new(ServerState::new(
        options,
        StatsStore::new(stats_path),
    )));
    start_tick_loop(state.clone());

    let app = Router::new()
        .route("/healthz", get(healthz))
        .route("/api/leaderboard", get(leaderboard_handler))
        .route("/api/world-states", get(world_states_handler))
        .route("/ws", get(ws_handler))
        .with_state(state);

    let app = if let Some(static_dir) = resolve_static_dir() {
        let index_file = static_dir.join("index.html");
        log::info!("static file root: {}", static_dir.to_string_lossy());
        app.fallback_service(
            ServeDir::new(static_dir).not_found_service(ServeFile::new(index_file)),
        )
    } else {
        log::warn!("static file root not found, serving the api only");
        app
    };

    let bind_addr = format!("0.0.0.0:{port}");
    let listener = match tokio::net::TcpListener::bind(&bind_addr).await {
        Ok(listener) => listener,
        Err(error) => {
            log::error!("failed to bind {bind_addr}: {error}");
            std::process::exit(1);
        }
    };

    log::info!("listening on :{port}");
    if let Err(error) = axum::serve(listener, app).await {
        log::error!("server runtime failed: {error}");
        std::process::exit(1);
    }
}

fn resolve_static_dir() -> Option<PathBuf> {
    if let Ok(raw) = std::env::var("STATIC_DIR") {
        let path = PathBuf::from(raw);
        if path.join("index.html").is_file() {
            return Some(path);
        }
    }

    [PathBuf::from("dist/client"), PathBuf::from("static")]
        .into_iter()
        .find(|path| path.join("index.html").is_file())
}

async fn healthz() -> impl IntoResponse {
    Json(json!({ "ok": true }))
}

async fn leaderboard_handler(
    State(state): State<SharedState>,
    Query(query): Query<LeaderboardQuery>,
) -> impl IntoResponse {
    let guard = state.lock().await;
    Json(
        guard
            .stats_store
            .build_response(parse_leaderboard_limit(query.limit.as_deref())),
    )
}

async fn world_states_handler(State(state): State<SharedState>) -> impl IntoResponse {
    let guard = state.lock().await;
    Json(json!({
        "running": guard.battleground.is_some(),
        "worldStates": guard.world_states.entries(),
    }))
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<SharedState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(state, socket))
}

async fn handle_socket(state: SharedState, socket: WebSocket) {
    let client_id = make_id("client");
    let (tx, mut rx) = mpsc::channel::<OutboundMessage>(256);

    {
        let mut guard = state.lock().await;
        guard.clients.insert(
            client_id.clone(),
            ClientContext {
                tx: tx.clone(),
                player_id: None,
            },
        );
    }

    let (mut ws_sender, mut ws_receiver) = socket.split();
    let writer = tokio::spawn(async move {
        while let Some(outbound) = rx.recv().await {
            let should_close = matches!(outbound, OutboundMessage::Close { .. });
            let result = match outbound {
                OutboundMessage::Text(payload) => {
                    ws_sender.send(Message::Text(payload.into())).await
                }
                OutboundMessage::Close { code, reason } => {
                    let frame = CloseFrame {
                        code,
                        reason: reason.into(),
                    };
                    ws_sender.send(Message::Close(Some(frame))).await
                }
            };
            if result.is_err() || should_close {
                break;
            }
        }
    });

    while let Some(received) = ws_receiver.next().await {
        let Ok(message) = received else {
            break;
        };

        match message {
            Message::Text(raw) => {
                handle_client_message(state.clone(), &client_id, raw.to_string()).await;
            }
            Message::Binary(raw) => {
                if let Ok(text) = String::from_utf8(raw.to_vec()) {
                    handle_client_message(state.clone(), &client_id, text).await;
                } else {
                    send_error_to_client(&state, &client_id, "invalid utf8 message").await;
                }
            }
            Message::Close(_) => break,
            _ => {}
        }
    }

    handle_disconnect(state, &client_id).await;
    drop(tx);
    let _ = writer.await;
}

async fn handle_client_message(state: SharedState, client_id: &str, raw: String) {
    let Some(message) = parse_client_message(&raw) else {
        send_error_to_client(&state, client_id, "invalid message").await;
        return;
    };

    let mut guard = state.lock().await;
    let player_id = guard
        .clients
        .get(client_id)
        .and_then(|ctx| ctx.player_id.clone());

    match message {
        ParsedClientMessage::Hello {
            name,
            team,
            reconnect_token,
        } => handle_hello(&mut guard, client_id, name, team, reconnect_token),
        ParsedClientMessage::Ping { t } => send_to_client(
            &mut guard,
            client_id,
            &json!({ "type": "pong", "t": t }),
            QueuePolicy::DisconnectOnFull,
        ),
        action => {
            let Some(player_id) = player_id else {
                send_error(&mut guard, client_id, "send hello first");
                return;
            };
            handle_player_action(&mut guard, client_id, &player_id, action);
        }
    }
}

fn handle_player_action(
    state: &mut ServerState,
    client_id: &str,
    player_id: &str,
    action: ParsedClientMessage,
) {
    match action {
        ParsedClientMessage::Start => handle_start(state, player_id),
        ParsedClientMessage::Click { node } => {
            if let Some(battleground) = state.battleground.as_mut() {
                battleground.event_player_clicked_on_flag(player_id, node);
            }
        }
        ParsedClientMessage::AreaTrigger { id } => {
            let handled = state
                .battleground
                .as_mut()
                .map(|battleground| battleground.handle_area_trigger(player_id, id));
            if handled == Some(false) {
                send_error(state, client_id, "unknown area trigger");
            }
        }
        ParsedClientMessage::Position { position } => {
            if let Some(battleground) = state.battleground.as_mut() {
                battleground.set_player_position(player_id, position);
            }
        }
        ParsedClientMessage::Hello { .. } | ParsedClientMessage::Ping { .. } => {}
    }
}

fn handle_hello(
    state: &mut ServerState,
    client_id: &str,
    requested_name: String,
    requested_team: Option<Team>,
    reconnect_token: Option<String>,
) {
    let name = sanitize_name(&requested_name);

    let existing_id = reconnect_token
        .as_deref()
        .and_then(|token| find_player_id_by_token(state, token));

    let player_id = match existing_id {
        Some(existing_id) => {
            if let Some(member) = state.lobby_players.get_mut(&existing_id) {
                member.name = name;
                member.connected = true;
            }
            existing_id
        }
        None => {
            let team = requested_team.unwrap_or_else(|| {
                let count = |team: Team| {
                    state
                        .lobby_players
                        .values()
                        .filter(|member| member.connected && member.team == team)
                        .count()
                };
                balance_team(count(Team::Alliance), count(Team::Horde))
            });
            let player_id = make_id("player");
            state.lobby_players.insert(
                player_id.clone(),
                LobbyPlayerInternal {
                    id: player_id.clone(),
                    name,
                    team,
                    connected: true,
                    reconnect_token: make_reconnect_token(),
                },
            );
            player_id
        }
    };

    bind_client_to_player(state, client_id, &player_id);
    if let (Some(battleground), Some(member)) = (
        state.battleground.as_mut(),
        state.lobby_players.get(&player_id),
    ) {
        battleground.add_player(MatchPlayer {
            id: member.id.clone(),
            name: member.name.clone(),
            team: member.team,
        });
    }

    ensure_host_assigned(state, Some(player_id.clone()));
    send_welcome_and_initial_state(state, client_id, &player_id);
    broadcast_lobby(state, None);
}

fn handle_start(state: &mut ServerState, requested_by: &str) {
    if state.battleground.is_some() {
        return;
    }

    ensure_host_assigned(state, None);
    if state.host_id.as_deref() != Some(requested_by) {
        if let Some(client_id) = state.active_client_by_player_id.get(requested_by).cloned() {
            send_error(state, &client_id, "only host can start");
        }
        return;
    }

    let mut members: Vec<LobbyPlayerInternal> = state
        .lobby_players
        .values()
        .filter(|member| member.connected)
        .cloned()
        .collect();
    members.sort_by_key(|member| player_order_key(&member.id));

    let mut options = state.options.clone();
    options.holiday_weekend = options.holiday_weekend || is_holiday_weekend(Utc::now());

    let mut battleground: Box<dyn Battleground + Send> =
        Box::new(BattlegroundEngine::new(options));
    for member in &members {
        battleground.add_player(MatchPlayer {
            id: member.id.clone(),
            name: member.name.clone(),
            team: member.team,
        });
    }
    battleground.start();
    state.world_states = WorldStateTable::from_updates(&battleground.fill_initial_world_states());
    state.battleground = Some(battleground);

    let start_note = format!("Battle started with {} players", members.len());
    broadcast_lobby(state, Some(start_note));
    let world_states = state.world_states.entries();
    broadcast(
        state,
        &json!({ "type": "match_init", "worldStates": world_states }),
        QueuePolicy::DisconnectOnFull,
    );
}

async fn handle_disconnect(state: SharedState, client_id: &str) {
    let mut guard = state.lock().await;
    disconnect_client_internal(&mut guard, client_id, true);
}

fn disconnect_client_internal(state: &mut ServerState, client_id: &str, broadcast_after: bool) {
    let Some(context) = state.clients.remove(client_id) else {
        return;
    };
    let Some(bound_player_id) = context.player_id else {
        return;
    };

    if state
        .active_client_by_player_id
        .get(&bound_player_id)
        .map(|active| active != client_id)
        .unwrap_or(true)
    {
        return;
    }
    state.active_client_by_player_id.remove(&bound_player_id);

    if let Some(battleground) = state.battleground.as_mut() {
        battleground.remove_player(&bound_player_id);
        if let Some(member) = state.lobby_players.get_mut(&bound_player_id) {
            member.connected = false;
        }
        let anyone_left = state.lobby_players.values().any(|member| member.connected);
        if !anyone_left {
            let winner = battleground.premature_winner();
            log::info!("all players left, ending early with winner {winner:?}");
            battleground.end_battleground(winner);
        }
    } else {
        state.lobby_players.remove(&bound_player_id);
    }

    if state.host_id.as_deref() == Some(&bound_player_id) {
        state.host_id = choose_next_host(state);
    }

    if broadcast_after {
        broadcast_lobby(state, None);
    }
}

fn send_welcome_and_initial_state(state: &mut ServerState, client_id: &str, player_id: &str) {
    let Some(member) = state.lobby_players.get(player_id).cloned() else {
        return;
    };

    send_to_client(
        state,
        client_id,
        &json!({
            "type": "welcome",
            "playerId": member.id,
            "team": member.team,
            "reconnectToken": member.reconnect_token,
            "isHost": state.host_id.as_deref() == Some(player_id),
        }),
        QueuePolicy::DisconnectOnFull,
    );

    let Some(battleground) = state.battleground.as_mut() else {
        return;
    };
    let world_states = battleground.fill_initial_world_states();
    let snapshot = battleground.build_snapshot(false);

    send_to_client(
        state,
        client_id,
        &json!({ "type": "match_init", "worldStates": world_states }),
        QueuePolicy::DisconnectOnFull,
    );
    send_to_client(
        state,
        client_id,
        &json!({ "type": "state", "snapshot": snapshot }),
        QueuePolicy::DisconnectOnFull,
    );
}

fn bind_client_to_player(state: &mut ServerState, client_id: &str, player_id: &str) {
    if let Some(old_client_id) = state.active_client_by_player_id.get(player_id).cloned() {
        if old_client_id != client_id {
            if let Some(old_client) = state.clients.get_mut(&old_client_id) {
                old_client.player_id = None;
                let _ = old_client.tx.try_send(OutboundMessage::Close {
                    code: 4001,
                    reason: "superseded by new connection".to_string(),
                });
            }
        }
    }

    let previous_player_id = state
        .clients
        .get(client_id)
        .and_then(|ctx| ctx.player_id.clone());
    if let Some(previous_player_id) = previous_player_id {
        if previous_player_id != player_id {
            state.active_client_by_player_id.remove(&previous_player_id);
        }
    }

    if let Some(ctx) = state.clients.get_mut(client_id) {
        ctx.player_id = Some(player_id.to_string());
    }
    state
        .active_client_by_player_id
        .insert(player_id.to_string(), client_id.to_string());
}

fn broadcast_lobby(state: &mut ServerState, note: Option<String>) {
    ensure_host_assigned(state, None);

    let mut players: Vec<LobbyPlayerInternal> = state.lobby_players.values().cloned().collect();
    players.sort_by(|a, b| a.name.cmp(&b.name));

    let can_start = state
        .host_id
        .as_ref()
        .and_then(|host_id| state.lobby_players.get(host_id))
        .map(|host| host.connected)
        .unwrap_or(false);

    let players_payload: Vec<Value> = players
        .iter()
        .map(|player| {
            json!({
                "id": player.id,
                "name": player.name,
                "team": player.team,
                "connected": player.connected,
                "isHost": state.host_id.as_deref() == Some(player.id.as_str()),
            })
        })
        .collect();

    broadcast(
        state,
        &json!({
            "type": "lobby",
            "players": players_payload,
            "hostId": state.host_id,
            "canStart": can_start,
            "running": state.battleground.is_some(),
            "note": note,
        }),
        QueuePolicy::DisconnectOnFull,
    );
}

fn start_tick_loop(state: SharedState) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_millis(TICK_MS));
        loop {
            interval.tick().await;
            let mut guard = state.lock().await;
            tick_battleground(&mut guard);
        }
    });
}

fn tick_battleground(state: &mut ServerState) {
    let mut sink = ServerSink::default();
    let snapshot = {
        let Some(battleground) = state.battleground.as_mut() else {
            return;
        };
        battleground.update(TICK_MS);
        let effects = battleground.drain_effects();
        dispatch_effects(&mut sink, &effects);
        for player_id in &sink.departures {
            battleground.remove_player(player_id);
        }
        battleground.build_snapshot(false)
    };

    deliver_effects(state, sink);
    broadcast(
        state,
        &json!({ "type": "state", "snapshot": snapshot }),
        QueuePolicy::DropOnFull,
    );

    let summary = {
        let Some(battleground) = state.battleground.as_ref() else {
            return;
        };
        if battleground.is_ended() {
            Some(battleground.build_summary())
        } else {
            None
        }
    };

    if let Some(summary) = summary {
        state.stats_store.record_match(&summary);
        broadcast(
            state,
            &json!({ "type": "match_over", "summary": summary }),
            QueuePolicy::DisconnectOnFull,
        );

        state.battleground = None;
        state.lobby_players.retain(|_, member| member.connected);
        ensure_host_assigned(state, None);
        broadcast_lobby(state, Some("Battle over, the host may start again".to_string()));
    }
}

fn deliver_effects(state: &mut ServerState, sink: ServerSink) {
    if !sink.world_states.is_empty() {
        for update in &sink.world_states {
            state.world_states.apply(*update);
        }
        broadcast(
            state,
            &json!({ "type": "world_states", "updates": sink.world_states }),
            QueuePolicy::DropOnFull,
        );
    }

    for (audience, payload) in sink.outbox {
        match audience {
            Audience::All => broadcast(state, &payload, QueuePolicy::DisconnectOnFull),
            Audience::Team(team) => broadcast_team(state, team, &payload),
            Audience::Player(player_id) => send_to_player(state, &player_id, &payload),
        }
    }

    for player_id in sink.departures {
        send_to_player(state, &player_id, &json!({ "type": "left_battleground" }));
    }
}

fn send_to_player(state: &mut ServerState, player_id: &str, message: &Value) {
    if let Some(client_id) = state.active_client_by_player_id.get(player_id).cloned() {
        send_to_client(state, &client_id, message, QueuePolicy::DisconnectOnFull);
    }
}

fn broadcast_team(state: &mut ServerState, team: Team, message: &Value) {
    let player_ids: Vec<String> = state
        .lobby_players
        .values()
        .filter(|member| member.connected && member.team == team)
        .map(|member| member.id.clone())
        .collect();
    for player_id in player_ids {
        send_to_player(state, &player_id, message);
    }
}

fn send_to_client(state: &mut ServerState, client_id: &str, message: &Value, policy: QueuePolicy) {
    let send_failed = if let Some(client) = state.clients.get(client_id) {
        client
            .tx
            .try_send(OutboundMessage::Text(message.to_string()))
            .is_err()
    } else {
        false
    };
    if send_failed && policy == QueuePolicy::DisconnectOnFull {
        disconnect_client_internal(state, client_id, false);
    }
}

fn send_error(state: &mut ServerState, client_id: &str, message: &str) {
    send_to_client(
        state,
        client_id,
        &json!({ "type": "error", "message": message }),
        QueuePolicy::DisconnectOnFull,
    );
}

fn broadcast(state: &mut ServerState, message: &Value, policy: QueuePolicy) {
    let payload = message.to_string();
    let client_ids: Vec<String> = state.clients.keys().cloned().collect();
    let mut failed_clients = Vec::new();
    for client_id in client_ids {
        let Some(client) = state.clients.get(&client_id) else {
            continue;
        };
        if !can_receive_broadcast(state, &client_id, client) {
            continue;
        }
        if client
            .tx
            .try_send(OutboundMessage::Text(payload.clone()))
            .is_err()
            && policy == QueuePolicy::DisconnectOnFull
        {
            failed_clients.push(client_id);
        }
    }
    if policy == QueuePolicy::DisconnectOnFull {
        for client_id in failed_clients {
            disconnect_client_internal(state, &client_id, false);
        }
    }
}

fn can_receive_broadcast(state: &ServerState, client_id: &str, client: &ClientContext) -> bool {
    let Some(player_id) = client.player_id.as_ref() else {
        return false;
    };
    if state
        .active_client_by_player_id
        .get(player_id)
        .map(|id| id.as_str())
        != Some(client_id)
    {
        return false;
    }
    state.lobby_players.contains_key(player_id)
}

async fn send_error_to_client(state: &SharedState, client_id: &str, message: &str) {
    let mut guard = state.lock().await;
    send_error(&mut guard, client_id, message);
}

fn ensure_host_assigned(state: &mut ServerState, preferred_player_id: Option<String>) {
    if state
        .host_id
        .as_ref()
        .and_then(|host_id| state.lobby_players.get(host_id))
        .map(|host| host.connected)
        .unwrap_or(false)
    {
        return;
    }

    if let Some(preferred_player_id) = preferred_player_id {
        if state
            .lobby_players
            .get(&preferred_player_id)
            .map(|player| player.connected)
            .unwrap_or(false)
        {
            state.host_id = Some(preferred_player_id);
            return;
        }
    }

    state.host_id = choose_next_host(state);
}

fn choose_next_host(state: &ServerState) -> Option<String> {
    let mut connected: Vec<&LobbyPlayerInternal> = state
        .lobby_players
        .values()
        .filter(|player| player.connected)
        .collect();
    connected.sort_by_key(|player| player_order_key(&player.id));
    connected.first().map(|player| player.id.clone())
}

fn find_player_id_by_token(state: &ServerState, token: &str) -> Option<String> {
    state
        .lobby_players
        .values()
        .find(|player| player.reconnect_token == token)
        .map(|player| player.id.clone())
}

fn make_id(prefix: &str) -> String {
    let seq = NEXT_ID.fetch_add(1, Ordering::Relaxed);
    format!("{prefix}_{seq}")
}

fn make_reconnect_token() -> String {
    rand::rng()
        .sample_iter(Alphanumeric)
        .take(48)
        .map(char::from)
        .collect()
}
