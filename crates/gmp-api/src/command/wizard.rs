// Wizard command.
//
// Wizards are server-side multi-step workflows triggered with a single
// `run_wizard` command; their inputs travel as `event_data:<field>`
// parameters.

use std::sync::Arc;

use crate::error::Error;
use crate::http::{GmpHttp, Params};
use crate::xml::Element;

use super::{Response, post_command};

pub struct WizardCommand {
    http: Arc<GmpHttp>,
}

impl WizardCommand {
    pub fn new(http: Arc<GmpHttp>) -> Self {
        Self { http }
    }

    /// Run the named wizard. `event_data` fields are sent with the
    /// `event_data:` prefix; the raw `run_wizard_response` element comes
    /// back for the caller to interpret.
    pub async fn run(&self, name: &str, event_data: &Params) -> Result<Response<Element>, Error> {
        let mut params = Params::new().add("cmd", "run_wizard").add("name", name);
        for (field, value) in event_data.entries() {
            params = params.add(format!("event_data:{field}"), value);
        }

        let envelope = post_command(&self.http, params).await?;
        let element = envelope
            .root
            .child("run_wizard_response")
            .cloned()
            .ok_or_else(|| Error::MissingElement {
                context: "run_wizard_response".to_owned(),
            })?;
        Ok(Response::new(element, envelope.meta))
    }
}
