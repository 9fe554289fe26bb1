use std::time::Duration;

use tracing::{info, warn};

use crate::config::types::{MailConfig, PortalConfig, TimingConfig};
use crate::domain::scrape_request::Credentials;
use crate::domain::session::{ScrapeSession, SessionState};
use crate::error::{Result, ScrapeError};
use crate::portal::selectors;
use crate::ports::page::{PortalPage, WaitCondition};
use crate::ports::passcode::PasscodeProvider;

/// Drives the email, password and passcode steps of the portal login.
pub struct SessionAuthenticator {
    login_url: String,
    keystroke: Duration,
    step_settle: Duration,
    login_settle: Duration,
    element_timeout: Duration,
    login_timeout: Duration,
    mail_delay: Duration,
    passcode_budget: Duration,
}

impl SessionAuthenticator {
    pub fn new(portal: &PortalConfig, timing: &TimingConfig, mail: &MailConfig) -> Self {
        Self {
            login_url: portal.login_url.clone(),
            keystroke: timing.keystroke(),
            step_settle: timing.step_settle(),
            login_settle: Duration::from_millis(timing.login_settle_ms),
            element_timeout: timing.element_timeout(),
            login_timeout: Duration::from_millis(timing.login_timeout_ms),
            mail_delay: Duration::from_secs(mail.initial_delay_secs),
            passcode_budget: Duration::from_secs(mail.passcode_wait_secs),
        }
    }

    /// Log in and leave the session on the portal's landing page.
    ///
    /// Every failure here is an `Authentication` error except the ones that
    /// are already fatal on their own.
    pub async fn authenticate(
        &self,
        session: &mut ScrapeSession,
        credentials: &Credentials,
        passcodes: &dyn PasscodeProvider,
    ) -> Result<()> {
        session.advance(SessionState::Authenticating {
            passcode_pending: false,
        })?;
        self.login(session, credentials, passcodes)
            .await
            .map_err(|e| {
                if e.is_fatal() {
                    e
                } else {
                    ScrapeError::Authentication {
                        reason: e.to_string(),
                    }
                }
            })?;
        session.advance(SessionState::Authenticated)?;
        info!("Login successful");
        Ok(())
    }

    async fn login(
        &self,
        session: &mut ScrapeSession,
        credentials: &Credentials,
        passcodes: &dyn PasscodeProvider,
    ) -> Result<()> {
        let page = session.page().clone();

        info!("Opening partner portal login");
        page.goto(&self.login_url).await?;
        page.wait_for(selectors::EMAIL_INPUT, WaitCondition::Visible, self.login_timeout)
            .await?;
        page.type_slowly(selectors::EMAIL_INPUT, &credentials.email, self.keystroke)
            .await?;
        page.click(selectors::CONTINUE_BUTTON).await?;

        page.wait_for(selectors::PASSWORD_INPUT, WaitCondition::Visible, self.element_timeout)
            .await?;
        tokio::time::sleep(self.login_settle).await;
        page.type_slowly(selectors::PASSWORD_INPUT, &credentials.password, self.keystroke)
            .await?;
        tokio::time::sleep(self.login_settle).await;
        page.click(selectors::SIGN_IN_BUTTON).await?;

        page.wait_for(selectors::PASSCODE_INPUT, WaitCondition::Visible, self.login_timeout)
            .await?;
        session.advance(SessionState::Authenticating {
            passcode_pending: true,
        })?;
        info!(delay_secs = self.mail_delay.as_secs(), "Waiting for passcode email");
        tokio::time::sleep(self.mail_delay).await;

        let Some(passcode) = passcodes.fetch_passcode(self.passcode_budget).await? else {
            warn!("No passcode found in inbox");
            return Err(ScrapeError::Authentication {
                reason: "passcode not found in inbox".into(),
            });
        };
        info!(passcode_len = passcode.len(), "Passcode retrieved");

        self.submit_passcode(page.as_ref(), &passcode).await?;
        page.wait_for(selectors::LANDING_TABLE, WaitCondition::Visible, self.login_timeout)
            .await?;
        Ok(())
    }

    async fn submit_passcode(&self, page: &dyn PortalPage, passcode: &str) -> Result<()> {
        page.type_slowly(selectors::PASSCODE_INPUT, passcode, self.keystroke)
            .await?;
        tokio::time::sleep(self.step_settle).await;

        match page.element_state(selectors::PASSCODE_SUBMIT, 0).await? {
            None => Err(ScrapeError::Authentication {
                reason: "verify button not found".into(),
            }),
            Some(state) if state.disabled => Err(ScrapeError::Authentication {
                reason: "verify button is disabled".into(),
            }),
            Some(_) => page.click(selectors::PASSCODE_SUBMIT).await,
        }
    }
}
