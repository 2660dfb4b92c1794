//! # Back-Office Commands
//!
//! One variant per command. Each maps onto exactly one service call.
//!
//! ```text
//! open       ──► SessionLifecycle::open
//! close      ──► SessionLifecycle::close
//! reopen     ──► SessionLifecycle::reopen
//! status     ──► SessionLifecycle::current_session
//! sale       ──► SessionLifecycle::record_sale
//! movement   ──► SessionLifecycle::record_movement
//! auto-close ──► SessionLifecycle::auto_close / auto_close_stale
//! history    ──► SessionHistory::history
//! detail     ──► SessionHistory::detail
//! summary    ──► SessionHistory::reconciliation
//! ```
//!
//! Amounts are typed as decimals ("200.00") and parsed here, so a
//! non-numeric amount comes back as a VALIDATION_ERROR like any other bad
//! input. Output amounts are the same exact decimals, as JSON strings.

use chrono::{DateTime, Utc};
use clap::Subcommand;
use serde::Serialize;

use cashbox_core::validation::parse_amount;
use cashbox_core::{
    CashMovement, CashSession, HistoryFilter, ReconciliationSummary, Sale, SessionDetail,
    SessionRecord, SessionStatus, TerminalSnapshot,
};
use cashbox_db::Database;
use cashbox_shift::{
    CloseOutcome, CloseRequest, ReopenOutcome, SessionHistory, SessionLifecycle, ShiftConfig,
};

use crate::error::ApiError;

/// Note stored on sessions closed by `auto-close <SESSION_ID>` without `--reason`.
const DEFAULT_AUTO_CLOSE_REASON: &str = "auto-closed from back office";

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Open a cash session on a terminal
    Open {
        terminal_id: String,
        user_id: String,
        /// Opening float, e.g. 200.00
        opening_amount: String,
    },

    /// Close an open session against the counted cash
    Close {
        session_id: String,
        /// Cash counted in the drawer, e.g. 230.00
        declared: String,
        #[arg(long)]
        notes: Option<String>,
        /// Close as CLOSED_FORCE (requires --notes)
        #[arg(long)]
        force: bool,
        /// Manager authorizing a forced close
        #[arg(long)]
        authorized_by: Option<String>,
    },

    /// Reopen a closed session
    Reopen { session_id: String },

    /// Show a terminal's open session with a live reconciliation
    Status { terminal_id: String },

    /// List sessions, newest first
    History {
        #[arg(long)]
        location: Option<String>,
        #[arg(long)]
        terminal: Option<String>,
        /// OPEN, CLOSED, CLOSED_FORCE or CLOSED_AUTO
        #[arg(long)]
        status: Option<SessionStatus>,
        /// Earliest opened_at, RFC 3339
        #[arg(long)]
        from: Option<DateTime<Utc>>,
        /// Latest opened_at, RFC 3339
        #[arg(long)]
        to: Option<DateTime<Utc>>,
        /// 1..=100, defaults to history.default_limit
        #[arg(long)]
        limit: Option<u32>,
    },

    /// Show one session with its breakdowns
    Detail { session_id: String },

    /// Reconcile one session
    Summary { session_id: String },

    /// Record a sale on an open session
    Sale {
        session_id: String,
        /// CASH, CARD, TRANSFER or a known synonym
        payment_method: String,
        amount: String,
    },

    /// Record a deposit or withdrawal on an open session
    Movement {
        session_id: String,
        /// DEPOSIT, WITHDRAWAL or a known synonym
        movement_type: String,
        amount: String,
        #[arg(long)]
        description: Option<String>,
    },

    /// Auto-close one session, or every session open too long
    AutoClose {
        /// Close only this session
        session_id: Option<String>,
        #[arg(long)]
        reason: Option<String>,
    },
}

/// Command results, printed as JSON.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum Output {
    Session(CashSession),
    Closed(CloseOutcome),
    Reopened(ReopenOutcome),
    Status(TerminalSnapshot),
    History(Vec<SessionRecord>),
    Detail(Box<SessionDetail>),
    Summary(ReconciliationSummary),
    Sale(Sale),
    Movement(CashMovement),
    AutoClosed { closed: Vec<String> },
}

/// The services a command can reach.
pub struct Services {
    lifecycle: SessionLifecycle,
    history: SessionHistory,
}

impl Services {
    pub fn new(db: Database, config: &ShiftConfig) -> Self {
        Services {
            lifecycle: SessionLifecycle::from_config(db.clone(), config),
            history: SessionHistory::from_config(db, config),
        }
    }
}

impl Command {
    pub async fn run(self, services: &Services) -> Result<Output, ApiError> {
        let lifecycle = &services.lifecycle;

        let output = match self {
            Command::Open {
                terminal_id,
                user_id,
                opening_amount,
            } => {
                let amount = parse_amount("opening_amount", &opening_amount)?;
                Output::Session(lifecycle.open(&terminal_id, &user_id, amount).await?)
            }

            Command::Close {
                session_id,
                declared,
                notes,
                force,
                authorized_by,
            } => {
                let request = CloseRequest {
                    declared: parse_amount("closing_amount", &declared)?,
                    notes,
                    force,
                    authorized_by,
                };
                Output::Closed(lifecycle.close(&session_id, request).await?)
            }

            Command::Reopen { session_id } => Output::Reopened(lifecycle.reopen(&session_id).await?),

            Command::Status { terminal_id } => {
                Output::Status(lifecycle.current_session(&terminal_id).await?)
            }

            Command::History {
                location,
                terminal,
                status,
                from,
                to,
                limit,
            } => {
                let filter = HistoryFilter {
                    location_id: location,
                    terminal_id: terminal,
                    status,
                    start_date: from,
                    end_date: to,
                    limit,
                };
                Output::History(services.history.history(&filter).await?)
            }

            Command::Detail { session_id } => {
                Output::Detail(Box::new(services.history.detail(&session_id).await?))
            }

            Command::Summary { session_id } => {
                Output::Summary(services.history.reconciliation(&session_id).await?)
            }

            Command::Sale {
                session_id,
                payment_method,
                amount,
            } => {
                let amount = parse_amount("total_amount", &amount)?;
                Output::Sale(lifecycle.record_sale(&session_id, &payment_method, amount).await?)
            }

            Command::Movement {
                session_id,
                movement_type,
                amount,
                description,
            } => {
                let amount = parse_amount("amount", &amount)?;
                Output::Movement(
                    lifecycle
                        .record_movement(&session_id, &movement_type, amount, description.as_deref())
                        .await?,
                )
            }

            Command::AutoClose { session_id: Some(session_id), reason } => {
                let reason = reason.as_deref().unwrap_or(DEFAULT_AUTO_CLOSE_REASON);
                Output::Closed(lifecycle.auto_close(&session_id, reason).await?)
            }

            Command::AutoClose { session_id: None, .. } => Output::AutoClosed {
                closed: lifecycle.auto_close_stale(Utc::now()).await?,
            },
        };

        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use cashbox_core::{Terminal, TerminalStatus, User};
    use cashbox_db::DbConfig;

    async fn services() -> Services {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut uow = db.begin().await.unwrap();
        uow.users()
            .insert(&User {
                id: "user-1".into(),
                name: "Ana".into(),
            })
            .await
            .unwrap();
        uow.terminals()
            .insert(&Terminal {
                id: "term-1".into(),
                name: "Caja 1".into(),
                location_id: "store-1".into(),
                status: TerminalStatus::Closed,
                current_cashier_id: None,
                updated_at: Utc::now(),
            })
            .await
            .unwrap();
        uow.commit().await.unwrap();

        Services::new(db, &ShiftConfig::default())
    }

    #[tokio::test]
    async fn test_open_and_close_through_commands() {
        let services = services().await;

        let opened = Command::Open {
            terminal_id: "term-1".into(),
            user_id: "user-1".into(),
            opening_amount: "200.00".into(),
        }
        .run(&services)
        .await
        .unwrap();
        let json = serde_json::to_value(&opened).unwrap();
        assert_eq!(json["opening_amount"], "200.00");
        let Output::Session(session) = opened else {
            panic!("expected a session");
        };

        let closed = Command::Close {
            session_id: session.id.clone(),
            declared: "195".into(),
            notes: None,
            force: false,
            authorized_by: None,
        }
        .run(&services)
        .await
        .unwrap();

        let json = serde_json::to_value(&closed).unwrap();
        assert_eq!(json["session"]["status"], "CLOSED");
        assert_eq!(json["session"]["closing_amount"], "195.00");
        assert_eq!(json["session"]["cash_difference"], "-5.00");
        assert_eq!(json["summary"]["theoretical_cash"], "200.00");
    }

    #[tokio::test]
    async fn test_amounts_print_in_the_unit_they_were_typed() {
        let services = services().await;

        let opened = Command::Open {
            terminal_id: "term-1".into(),
            user_id: "user-1".into(),
            opening_amount: "150.5".into(),
        }
        .run(&services)
        .await
        .unwrap();
        let Output::Session(session) = opened else {
            panic!("expected a session");
        };

        let sale = Command::Sale {
            session_id: session.id.clone(),
            payment_method: "CASH".into(),
            amount: "0.07".into(),
        }
        .run(&services)
        .await
        .unwrap();
        let json = serde_json::to_value(&sale).unwrap();
        assert_eq!(json["total_amount"], "0.07");

        let summary = Command::Summary {
            session_id: session.id,
        }
        .run(&services)
        .await
        .unwrap();
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["opening_amount"], "150.50");
        assert_eq!(json["cash_sales"], "0.07");
        assert_eq!(json["theoretical_cash"], "150.57");
    }

    #[tokio::test]
    async fn test_amount_over_ceiling_is_validation_error() {
        let services = services().await;

        let err = Command::Open {
            terminal_id: "term-1".into(),
            user_id: "user-1".into(),
            opening_amount: "92233720368547758.07".into(),
        }
        .run(&services)
        .await
        .unwrap_err();

        assert_eq!(err.code, ErrorCode::ValidationError);
        assert_eq!(err.message, "opening_amount must not exceed 1000000000.00");
    }

    #[tokio::test]
    async fn test_non_numeric_amount_is_validation_error() {
        let services = services().await;

        let err = Command::Open {
            terminal_id: "term-1".into(),
            user_id: "user-1".into(),
            opening_amount: "two hundred".into(),
        }
        .run(&services)
        .await
        .unwrap_err();

        assert_eq!(err.code, ErrorCode::ValidationError);
    }

    #[tokio::test]
    async fn test_unknown_terminal_is_not_found() {
        let services = services().await;

        let err = Command::Status {
            terminal_id: "term-9".into(),
        }
        .run(&services)
        .await
        .unwrap_err();

        assert_eq!(err.code, ErrorCode::NotFound);
    }
}
