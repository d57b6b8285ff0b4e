// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Phone number management and outbound call placement.
//!
//! Numbers bought or updated here are bound to the provider's callback
//! application, so their SMS and voice webhooks reach this process.

use tracing::info;

use switchboard_core::{Provider, SwitchboardError};

use crate::carrier::Carrier;
use crate::provider::ProviderConfig;
use crate::resources::{AvailablePhoneNumber, CallResource, IncomingPhoneNumber};

/// Number searches are limited to one page of this size.
pub const AVAILABLE_NUMBERS_PAGE_SIZE: u32 = 20;

/// Subtype tagging the voice webhook of a click-to-call leg.
pub const CALLBACK_DIAL_SUBTYPE: &str = "callback_dial";

/// Parameters for [`Carrier::click_to_call`].
#[derive(Debug, Clone)]
pub struct ClickToCall {
    pub provider: Provider,
    /// Public URL of this process's webhook route.
    pub webhook_url: String,
    /// The caller's own phone, rung first.
    pub physical_number: String,
    /// Our number, shown as the caller id.
    pub virtual_number: String,
    /// Party connected once the physical leg answers.
    pub recipient_number: String,
}

impl Carrier {
    /// Lists purchasable US local numbers in `area_code` with SMS and voice.
    ///
    /// `locality` narrows the search on Twilio; SignalWire ignores it.
    pub async fn available_numbers(
        &self,
        provider: Provider,
        area_code: &str,
        locality: Option<&str>,
    ) -> Result<Vec<AvailablePhoneNumber>, SwitchboardError> {
        let config = self.provider(provider)?;
        let mut query = vec![
            ("AreaCode", area_code.to_string()),
            ("SmsEnabled", "true".to_string()),
            ("VoiceEnabled", "true".to_string()),
            ("PageSize", AVAILABLE_NUMBERS_PAGE_SIZE.to_string()),
            ("Page", "0".to_string()),
        ];
        if let Some(locality) = locality.filter(|_| config.supports_address_sid()) {
            query.push(("InLocality", locality.to_string()));
        }
        self.client().list_available_numbers(&config, &query).await
    }

    /// Buys `phone_number` and points its webhooks at the callback application.
    pub async fn purchase_number(
        &self,
        provider: Provider,
        phone_number: &str,
    ) -> Result<IncomingPhoneNumber, SwitchboardError> {
        let config = self.provider(provider)?;
        let mut fields = vec![("PhoneNumber", phone_number.to_string())];
        fields.extend(binding_fields(&config)?);

        let number = self.client().purchase_number(&config, &fields).await?;
        info!(
            provider = %provider,
            number_sid = number.sid.as_deref().unwrap_or_default(),
            "phone number purchased"
        );
        Ok(number)
    }

    /// The owned number matching `phone_number`, if exactly one does.
    pub async fn incoming_number(
        &self,
        provider: Provider,
        phone_number: &str,
    ) -> Result<Option<IncomingPhoneNumber>, SwitchboardError> {
        let config = self.provider(provider)?;
        let mut numbers = self
            .client()
            .list_incoming_numbers(&config, phone_number)
            .await?;
        Ok(if numbers.len() == 1 { numbers.pop() } else { None })
    }

    /// Renames number `sid` and rebinds it to the callback application.
    pub async fn update_incoming_number(
        &self,
        provider: Provider,
        sid: &str,
        friendly_name: &str,
    ) -> Result<IncomingPhoneNumber, SwitchboardError> {
        let config = self.provider(provider)?;
        let mut fields = vec![("FriendlyName", friendly_name.to_string())];
        fields.extend(binding_fields(&config)?);
        self.client()
            .update_incoming_number(&config, sid, &fields)
            .await
    }

    /// Moves number `sid` into the configured `migrate_account_sid`.
    ///
    /// Only Twilio supports moving numbers between accounts.
    pub async fn migrate_incoming_number(
        &self,
        provider: Provider,
        sid: &str,
    ) -> Result<IncomingPhoneNumber, SwitchboardError> {
        if provider != Provider::Twilio {
            return Err(SwitchboardError::Validation(format!(
                "number migration is not supported on {provider}"
            )));
        }
        let config = self.provider(provider)?;
        let target = config.migrate_account_sid.clone().ok_or_else(|| {
            SwitchboardError::Config(format!("{provider} migrate_account_sid is not configured"))
        })?;

        let mut fields = vec![("AccountSid", target.clone())];
        if let Some(address_sid) = &config.migrate_address_sid {
            fields.push(("AddressSid", address_sid.clone()));
        }
        let number = self
            .client()
            .update_incoming_number(&config, sid, &fields)
            .await?;
        info!(provider = %provider, number_sid = sid, target_account = %target, "phone number migrated");
        Ok(number)
    }

    /// Media URL of a recording, given its path under the REST host
    /// (e.g. `/2010-04-01/Accounts/AC.../Recordings/RE...`).
    pub async fn recording_url(
        &self,
        provider: Provider,
        relative_url: &str,
    ) -> Result<Option<String>, SwitchboardError> {
        let config = self.provider(provider)?;
        self.client().recording_location(&config, relative_url).await
    }

    /// Rings `physical_number` from `virtual_number`; the answered leg's
    /// voice webhook carries `subtype=callback_dial` and the recipient.
    pub async fn click_to_call(&self, call: &ClickToCall) -> Result<CallResource, SwitchboardError> {
        let config = self.provider(call.provider)?;
        let credentials = &config.inbound_credentials;
        let callback_token = credentials
            .get_app_secret(credentials.app_id())
            .await
            .ok_or_else(|| {
                SwitchboardError::Config(format!("{} callback_token is not configured", call.provider))
            })?;

        let recipient = call.recipient_number.trim_start_matches('+');
        let provider = call.provider.to_string();
        let answer_url = webhook_url(
            &call.webhook_url,
            &[
                ("provider", &provider),
                ("type", "voice"),
                ("callback_token", &callback_token),
                ("subtype", CALLBACK_DIAL_SUBTYPE),
                ("value", recipient),
            ],
        )?;
        let status_url = webhook_url(
            &call.webhook_url,
            &[
                ("provider", &provider),
                ("type", "voice_status"),
                ("callback_token", &callback_token),
                ("recipient", recipient),
            ],
        )?;

        info!(provider = %call.provider, "placing click-to-call");
        self.client()
            .place_call(
                &config,
                &[
                    ("To", call.physical_number.clone()),
                    ("From", call.virtual_number.clone()),
                    ("Url", answer_url),
                    ("StatusCallback", status_url),
                ],
            )
            .await
    }
}

/// `AddressSid` (not on SignalWire) and both application bindings.
fn binding_fields(config: &ProviderConfig) -> Result<Vec<(&'static str, String)>, SwitchboardError> {
    let app_id = config.callback_app_id.clone().ok_or_else(|| {
        SwitchboardError::Config(format!("{} callback_app_id is not configured", config.provider))
    })?;

    let mut fields = Vec::with_capacity(3);
    if config.supports_address_sid() {
        if let Some(address_sid) = &config.address_sid {
            fields.push(("AddressSid", address_sid.clone()));
        }
    }
    fields.push(("SmsApplicationSid", app_id.clone()));
    fields.push(("VoiceApplicationSid", app_id));
    Ok(fields)
}

fn webhook_url(base: &str, params: &[(&str, &str)]) -> Result<String, SwitchboardError> {
    let mut url = url::Url::parse(base)
        .map_err(|e| SwitchboardError::Validation(format!("invalid webhook url `{base}`: {e}")))?;
    url.query_pairs_mut().extend_pairs(params.iter());
    Ok(url.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn webhook_url_appends_encoded_params() {
        let url = webhook_url(
            "https://bot.example.com/client/v1.0.0/carrier/api",
            &[("provider", "twilio"), ("callback_token", "a b&c")],
        )
        .unwrap();
        assert_eq!(
            url,
            "https://bot.example.com/client/v1.0.0/carrier/api?provider=twilio&callback_token=a+b%26c"
        );
    }

    #[test]
    fn relative_webhook_url_is_rejected() {
        assert!(webhook_url("/client/v1.0.0/carrier/api", &[]).is_err());
    }
}
