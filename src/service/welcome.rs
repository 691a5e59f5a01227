//! Welcome payload: who this service is.

use crate::config::AppInfo;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WelcomePayload {
    pub name: String,
    pub domain: String,
    pub version: String,
    pub source: String,
    pub description: String,
}

pub struct WelcomeService<'a> {
    app: &'a AppInfo,
}

impl<'a> WelcomeService<'a> {
    pub fn new(app: &'a AppInfo) -> Self {
        WelcomeService { app }
    }

    pub fn find_one(&self) -> WelcomePayload {
        WelcomePayload {
            name: self.app.name.clone(),
            domain: self.app.domain.clone(),
            version: self.app.version.clone(),
            source: self.app.source.clone(),
            description: self.app.description.clone(),
        }
    }
}
