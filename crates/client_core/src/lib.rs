//! Client core for the portfolio site: CMS gateway, contact form state
//! machine, and the view models built on top of them.

pub mod contact_form;
pub mod gateway;
pub mod portfolio;
pub mod resume;
pub mod ui;

pub use contact_form::{
    ContactFormController, ContactFormOptions, FormCollaborators, SubmissionState, SubmitOutcome,
};
pub use gateway::{CmsGateway, ContactSubmitter, GatewayError, RequestOptions};
pub use portfolio::{Portfolio, PortfolioState};
pub use resume::{ResumeAction, ResumeDownloader};
