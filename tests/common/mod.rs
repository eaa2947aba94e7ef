#![allow(dead_code)]

use nest_funds::config::AppConfig;
use nest_funds::database::db::{connection, migrate};
use nest_funds::database::models::{NewService, Role, ServiceType};
use nest_funds::domain::auth::Actor;
use nest_funds::domain::{members, services};
use sqlx::{Pool, Sqlite};

pub const PASSWORD: &str = "secret123";

pub fn test_config() -> AppConfig {
    AppConfig {
        bcrypt_cost: 4,
        ..AppConfig::default()
    }
}

pub async fn setup() -> (Pool<Sqlite>, AppConfig) {
    let pool = connection::get_memory_pool().await.unwrap();
    migrate::run_migrations(&pool).await.unwrap();
    (pool, test_config())
}

pub async fn user(pool: &Pool<Sqlite>, cfg: &AppConfig, email: &str, role: Role) -> Actor {
    let name = email.split('@').next().unwrap_or(email);
    let u = members::create_user(pool, cfg, email, PASSWORD, name, role)
        .await
        .unwrap();
    Actor::from(&u)
}

pub async fn admin(pool: &Pool<Sqlite>, cfg: &AppConfig) -> Actor {
    user(pool, cfg, "admin@example.com", Role::Admin).await
}

pub async fn member(pool: &Pool<Sqlite>, cfg: &AppConfig) -> Actor {
    user(pool, cfg, "member@example.com", Role::Member).await
}

pub async fn service(pool: &Pool<Sqlite>, admin: &Actor, name: &str) -> i64 {
    let input = NewService {
        name: name.to_string(),
        description: Some("Monthly upkeep".into()),
        service_type: ServiceType::MasjidFund,
        target_amount: Some(1000.into()),
    };
    services::create_service(pool, admin, input)
        .await
        .unwrap()
        .data
        .id
}
