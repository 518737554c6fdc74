//! Blackboard demo binary.
//!
//! Walks through the library's surface against the in-memory backend:
//! basic set/get/update/drop, observer wiring, complex nested data
//! through a typed schema, and a save/close/reload cycle.
//!
//! # Environment Variables
//!
//! - `RUST_LOG` — log filter (default: "info")
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin demo
//! ```

use serde::{Deserialize, Serialize};
use serde_json::json;

use blackboard::{Blackboard, BlackboardConfig, TypedSchema};

#[derive(Debug, PartialEq, Serialize, Deserialize)]
struct Address {
    country: String,
    city: String,
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
struct User {
    name: String,
    skills: Vec<String>,
    age: f64,
    address: Address,
}

fn main() -> blackboard::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    basic_usage()?;
    observers()?;
    complex_data()?;
    save_and_reload()?;
    Ok(())
}

fn basic_usage() -> blackboard::Result<()> {
    println!("--- basic usage ---");
    let mut board = Blackboard::new(BlackboardConfig::memory())?;

    board.set(
        "user",
        json!({"name": "G.Ted", "email": "gted221@example.com"}),
        None,
        false,
    )?;
    println!("get user      -> {}", board.get("user")?);

    board.update(
        "user",
        json!({"name": "Ted2", "email": "gted221@example.com"}),
    )?;
    println!("after update  -> {}", board.get("user")?);

    board.drop_key("user")?;
    println!("after drop    -> {:?}", board.get("user").unwrap_err());

    board.close()
}

fn observers() -> blackboard::Result<()> {
    println!("--- observers ---");
    let mut board = Blackboard::new(BlackboardConfig::memory())?;

    board.set("temperature", json!(20.1), None, false)?;
    let handle = board.register_observer("temperature", |value| {
        println!("observer saw  -> {}", value);
    })?;

    board.update("temperature", json!(22.8))?;
    board.remove_observer("temperature", handle)?;
    board.update("temperature", json!(25.0))?; // silent

    board.clear()?;
    board.close()
}

fn complex_data() -> blackboard::Result<()> {
    println!("--- complex data ---");
    let mut board = Blackboard::new(BlackboardConfig::memory())?;

    let user = User {
        name: "G.Ted".to_string(),
        skills: vec![
            "Rust".to_string(),
            "Git".to_string(),
            "Docker".to_string(),
            "ROS".to_string(),
        ],
        age: 20.5,
        address: Address {
            country: "S. Korea".to_string(),
            city: "Seoul".to_string(),
        },
    };

    let schema = TypedSchema::<User>::new();
    board.set(
        "user_info",
        serde_json::to_value(&user).expect("user serializes"),
        Some(schema),
        false,
    )?;

    let restored: User = board.get_as("user_info")?;
    println!("restored      -> {:?}", restored);
    assert_eq!(restored, user);

    board.clear()?;
    board.close()
}

fn save_and_reload() -> blackboard::Result<()> {
    println!("--- save / reload ---");
    let path = std::env::temp_dir().join("blackboard_demo.snapshot");
    let config = BlackboardConfig::memory().with_snapshot_path(&path);

    let mut board = Blackboard::new(config.clone())?;
    board.set("greeting", json!("hello, world"), None, false)?;
    board.set("answer", json!(42), None, false)?;
    board.save()?;
    board.clear()?;
    board.close()?;

    let mut board = Blackboard::new(config)?;
    board.load()?;
    println!("reloaded keys -> {:?}", board.keys());
    println!("greeting      -> {}", board.get("greeting")?);

    board.clear()?;
    board.close()?;
    let _ = std::fs::remove_file(path);
    Ok(())
}
