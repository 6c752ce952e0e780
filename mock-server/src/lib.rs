use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::State,
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct User {
    pub uuid: String,
    pub username: String,
    pub name: String,
    pub lastname: String,
    pub bio: String,
    pub balance: i64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AuthPayload {
    #[serde(rename = "accessToken")]
    pub access_token: String,
    pub token_type: String,
    pub me: User,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Message {
    pub message: String,
}

#[derive(Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct EditUser {
    pub name: Option<String>,
    pub lastname: Option<String>,
    pub bio: Option<String>,
    pub username: Option<String>,
}

struct Account {
    password: String,
    user: User,
}

#[derive(Default)]
pub struct Store {
    accounts: HashMap<String, Account>,
    tokens: HashMap<String, String>,
}

impl Store {
    fn issue_token(&mut self, email: &str) -> String {
        let token = Uuid::new_v4().simple().to_string();
        self.tokens.insert(token.clone(), email.to_string());
        token
    }

    fn email_for(&self, headers: &HeaderMap) -> Option<String> {
        self.tokens.get(bearer(headers)?).cloned()
    }
}

fn bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

pub type Db = Arc<RwLock<Store>>;

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Store::default()));
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/register", post(register))
        .route("/auth/logout", get(logout))
        .route("/user", get(me).put(edit_me))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn login(
    State(db): State<Db>,
    Json(input): Json<Credentials>,
) -> Result<Json<AuthPayload>, (StatusCode, Json<Message>)> {
    let mut store = db.write().await;
    let user = match store.accounts.get(&input.email) {
        Some(account) if account.password == input.password => account.user.clone(),
        _ => return Err(unprocessable("invalid credentials")),
    };
    let access_token = store.issue_token(&input.email);
    tracing::debug!(email = %input.email, "login");
    Ok(Json(AuthPayload {
        access_token,
        token_type: "Bearer".to_string(),
        me: user,
    }))
}

async fn register(
    State(db): State<Db>,
    Json(input): Json<Registration>,
) -> Result<Json<AuthPayload>, (StatusCode, Json<Message>)> {
    let mut store = db.write().await;
    if store.accounts.contains_key(&input.email) {
        return Err(unprocessable("email already registered"));
    }
    let user = User {
        uuid: Uuid::new_v4().to_string(),
        username: input.email.clone(),
        name: input.name,
        ..Default::default()
    };
    store.accounts.insert(
        input.email.clone(),
        Account {
            password: input.password,
            user: user.clone(),
        },
    );
    let access_token = store.issue_token(&input.email);
    tracing::debug!(email = %input.email, "register");
    Ok(Json(AuthPayload {
        access_token,
        token_type: "Bearer".to_string(),
        me: user,
    }))
}

async fn logout(
    State(db): State<Db>,
    headers: HeaderMap,
) -> Result<(StatusCode, Json<Message>), StatusCode> {
    let token = bearer(&headers).ok_or(StatusCode::UNAUTHORIZED)?;
    db.write()
        .await
        .tokens
        .remove(token)
        .ok_or(StatusCode::UNAUTHORIZED)?;
    Ok((
        StatusCode::CREATED,
        Json(Message {
            message: "Successfully logged out".to_string(),
        }),
    ))
}

async fn me(State(db): State<Db>, headers: HeaderMap) -> Result<Json<User>, StatusCode> {
    let store = db.read().await;
    let email = store.email_for(&headers).ok_or(StatusCode::UNAUTHORIZED)?;
    store
        .accounts
        .get(&email)
        .map(|account| Json(account.user.clone()))
        .ok_or(StatusCode::NOT_FOUND)
}

async fn edit_me(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(input): Json<EditUser>,
) -> Result<(StatusCode, Json<User>), StatusCode> {
    let mut store = db.write().await;
    let email = store.email_for(&headers).ok_or(StatusCode::UNAUTHORIZED)?;
    let account = store.accounts.get_mut(&email).ok_or(StatusCode::NOT_FOUND)?;
    if let Some(name) = input.name {
        account.user.name = name;
    }
    if let Some(lastname) = input.lastname {
        account.user.lastname = lastname;
    }
    if let Some(bio) = input.bio {
        account.user.bio = bio;
    }
    if let Some(username) = input.username {
        account.user.username = username;
    }
    Ok((StatusCode::CREATED, Json(account.user.clone())))
}

fn unprocessable(message: &str) -> (StatusCode, Json<Message>) {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(Message {
            message: message.to_string(),
        }),
    )
}
