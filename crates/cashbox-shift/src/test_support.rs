//! Fixtures shared by the service tests.

use chrono::Utc;

use cashbox_core::{Terminal, TerminalStatus, User};
use cashbox_db::{Database, DbConfig};

pub async fn memory_db() -> Database {
    Database::new(DbConfig::in_memory()).await.unwrap()
}

/// Seeds `user-1`, `user-2`, `mgr-1` and terminals `term-1..=term-{n}`.
/// Odd terminals belong to `store-1`, even ones to `store-2`.
pub async fn seeded_db(db: Database, terminals: usize) -> Database {
    let mut uow = db.begin().await.unwrap();

    for (id, name) in [
        ("user-1", "Ana Cashier"),
        ("user-2", "Luis Cashier"),
        ("mgr-1", "Marta Manager"),
    ] {
        uow.users()
            .insert(&User {
                id: id.to_string(),
                name: name.to_string(),
            })
            .await
            .unwrap();
    }

    for n in 1..=terminals {
        uow.terminals()
            .insert(&Terminal {
                id: format!("term-{n}"),
                name: format!("Caja {n}"),
                location_id: if n % 2 == 1 { "store-1" } else { "store-2" }.to_string(),
                status: TerminalStatus::Closed,
                current_cashier_id: None,
                updated_at: Utc::now(),
            })
            .await
            .unwrap();
    }

    uow.commit().await.unwrap();
    db
}
