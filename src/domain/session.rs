use std::sync::Arc;

use crate::error::{Result, ScrapeError};
use crate::ports::page::PortalPage;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unauthenticated,
    Authenticating { passcode_pending: bool },
    Authenticated,
    PropertySelected,
    ReservationsLoaded,
    Closed,
}

impl SessionState {
    pub fn can_advance_to(self, next: SessionState) -> bool {
        use SessionState::*;
        match (self, next) {
            (Closed, _) => false,
            (_, Closed) => true,
            (Unauthenticated, Authenticating { passcode_pending: false }) => true,
            (Authenticating { passcode_pending: false }, Authenticating { passcode_pending: true }) => {
                true
            }
            (Authenticating { .. }, Authenticated) => true,
            (Authenticated, PropertySelected | ReservationsLoaded) => true,
            (PropertySelected, ReservationsLoaded) => true,
            _ => false,
        }
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unauthenticated => write!(f, "unauthenticated"),
            Self::Authenticating {
                passcode_pending: true,
            } => write!(f, "authenticating (passcode pending)"),
            Self::Authenticating { .. } => write!(f, "authenticating"),
            Self::Authenticated => write!(f, "authenticated"),
            Self::PropertySelected => write!(f, "property selected"),
            Self::ReservationsLoaded => write!(f, "reservations loaded"),
            Self::Closed => write!(f, "closed"),
        }
    }
}

/// One browser page bound to one portal login, owned by a single run.
pub struct ScrapeSession {
    page: Arc<dyn PortalPage>,
    state: SessionState,
}

impl ScrapeSession {
    pub fn new(page: Arc<dyn PortalPage>) -> Self {
        Self {
            page,
            state: SessionState::Unauthenticated,
        }
    }

    pub fn page(&self) -> &Arc<dyn PortalPage> {
        &self.page
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn advance(&mut self, next: SessionState) -> Result<()> {
        if !self.state.can_advance_to(next) {
            return Err(ScrapeError::SessionState {
                from: self.state.to_string(),
                to: next.to_string(),
            });
        }
        tracing::debug!(from = %self.state, to = %next, "Session transition");
        self.state = next;
        Ok(())
    }

    pub fn require(&self, expected: SessionState) -> Result<()> {
        if self.state == expected {
            Ok(())
        } else {
            Err(ScrapeError::SessionState {
                from: self.state.to_string(),
                to: expected.to_string(),
            })
        }
    }

    /// Release the page. Safe to call more than once.
    pub async fn close(&mut self) {
        if self.state == SessionState::Closed {
            return;
        }
        if let Err(e) = self.page.close().await {
            tracing::warn!(error = %e, "Failed to close browser page");
        }
        self.state = SessionState::Closed;
    }
}
