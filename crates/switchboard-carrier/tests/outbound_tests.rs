// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Proactive conversations and number provisioning against a mock carrier API.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use serde_json::json;
use wiremock::matchers::{header_exists, method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

use switchboard_carrier::{ClickToCall, Topic};
use switchboard_core::{ActivityType, ConversationReference, Provider, SwitchboardError};
use switchboard_test_utils::fixtures::{
    sms_body, BOT_NUMBER, TEST_ACCOUNT_SID, TEST_ADDRESS_SID, TEST_CALLBACK_APP_ID,
    TEST_CALLBACK_TOKEN, TEST_MIGRATE_ACCOUNT_SID, TEST_MIGRATE_ADDRESS_SID,
    TEST_SIGNALWIRE_PROJECT, USER_NUMBER,
};
use switchboard_test_utils::CarrierHarness;

const SIGNALWIRE_API: &str = "/api/laml/2010-04-01";

fn twilio_account_path(resource: &str) -> String {
    format!("/2010-04-01/Accounts/{TEST_ACCOUNT_SID}/{resource}")
}

fn signalwire_account_path(resource: &str) -> String {
    format!("{SIGNALWIRE_API}/Accounts/{TEST_SIGNALWIRE_PROJECT}/{resource}")
}

async fn requests_to(harness: &CarrierHarness, resource: &str) -> Vec<wiremock::Request> {
    harness
        .server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|request| request.url.path().ends_with(resource))
        .collect()
}

fn form(request: &wiremock::Request) -> HashMap<String, String> {
    serde_urlencoded::from_bytes(&request.body).unwrap()
}

fn query(request: &wiremock::Request) -> HashMap<String, String> {
    request.url.query_pairs().into_owned().collect()
}

// --- proactive messaging ---

#[tokio::test]
async fn continue_conversation_replies_to_an_earlier_turn() {
    let harness = CarrierHarness::start().await.unwrap();
    harness.accept_messages().await;

    let stored: Arc<Mutex<Option<ConversationReference>>> = Arc::new(Mutex::new(None));
    let sink = stored.clone();
    harness.carrier.on_message(move |ctx, next| {
        *sink.lock().unwrap() = Some(ctx.conversation_reference());
        next.call()
    });
    let turn_types = Arc::new(Mutex::new(Vec::new()));
    let types = turn_types.clone();
    harness.carrier.on_turn(move |ctx, next| {
        types.lock().unwrap().push(ctx.activity().activity_type.clone());
        next.call()
    });

    harness
        .deliver(harness.webhook(
            "twilio",
            "message",
            Some(TEST_CALLBACK_TOKEN),
            &sms_body(TEST_ACCOUNT_SID, "remind me later"),
        ))
        .await;
    let reference = stored.lock().unwrap().clone().unwrap();
    assert_eq!(reference.channel_id.as_deref(), Some("twilio"));

    harness
        .carrier
        .continue_conversation(&reference, |ctx| async move {
            assert_eq!(ctx.activity().activity_type, ActivityType::Event);
            assert_eq!(
                ctx.activity().name.as_deref(),
                Some(switchboard_carrier::CONTINUE_CONVERSATION_EVENT)
            );
            ctx.send_text("here is your reminder").await?;
            Ok(())
        })
        .await
        .unwrap();

    assert_eq!(
        *turn_types.lock().unwrap(),
        vec![ActivityType::Message, ActivityType::Event]
    );

    let sent = requests_to(&harness, "/Messages.json").await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].url.path(), twilio_account_path("Messages.json"));
    assert_eq!(query(&sent[0])["ApplicationSid"], TEST_CALLBACK_APP_ID);
    let fields = form(&sent[0]);
    assert_eq!(fields["To"], USER_NUMBER);
    assert_eq!(fields["From"], BOT_NUMBER);
    assert_eq!(fields["Body"], "here is your reminder");
}

#[tokio::test]
async fn create_sms_conversation_sends_from_our_number() {
    let harness = CarrierHarness::start().await.unwrap();
    harness.accept_messages().await;
    let turns = Arc::new(AtomicUsize::new(0));
    let count = turns.clone();
    harness.carrier.on(Topic::Turn, move |_ctx, next| {
        count.fetch_add(1, Ordering::SeqCst);
        next.call()
    });

    harness
        .carrier
        .create_sms_conversation(Provider::SignalWire, BOT_NUMBER, USER_NUMBER, |ctx| async move {
            assert_eq!(ctx.provider(), Provider::SignalWire);
            let response = ctx.send_text("your code is 1234").await?;
            assert!(response.is_some());
            Ok(())
        })
        .await
        .unwrap();

    assert_eq!(turns.load(Ordering::SeqCst), 0);
    let sent = requests_to(&harness, "/Messages.json").await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].url.path(), signalwire_account_path("Messages.json"));
    let fields = form(&sent[0]);
    assert_eq!(fields["To"], USER_NUMBER);
    assert_eq!(fields["From"], BOT_NUMBER);
    assert_eq!(fields["Body"], "your code is 1234");
}

#[tokio::test]
async fn proactive_logic_errors_reach_the_turn_error_hook() {
    let harness = CarrierHarness::start().await.unwrap();
    harness
        .reject_messages(400, 21211, "The 'To' number is not a valid phone number.")
        .await;
    let hooked = Arc::new(Mutex::new(None));
    let sink = hooked.clone();
    harness.carrier.set_on_turn_error(move |_ctx, err| {
        let sink = sink.clone();
        async move {
            *sink.lock().unwrap() = Some(err.to_string());
            Ok(())
        }
    });

    harness
        .carrier
        .create_sms_conversation(Provider::Twilio, BOT_NUMBER, "+1555", |ctx| async move {
            ctx.send_text("never delivered").await?;
            Ok(())
        })
        .await
        .unwrap();

    let message = hooked.lock().unwrap().clone().unwrap();
    assert!(message.contains("not a valid phone number"), "{message}");
}

#[tokio::test]
async fn proactive_messages_need_a_service_url() {
    let harness = CarrierHarness::start().await.unwrap();
    let reference = ConversationReference {
        channel_id: Some("twilio".into()),
        service_url: None,
        ..ConversationReference::default()
    };
    let err = harness
        .carrier
        .create_conversation(&reference, |_ctx| async { Ok(()) })
        .await
        .unwrap_err();
    assert!(matches!(err, SwitchboardError::Validation(_)));
}

// --- provisioning ---

#[tokio::test]
async fn twilio_number_search_filters_by_locality() {
    let harness = CarrierHarness::start().await.unwrap();
    Mock::given(method("GET"))
        .and(path(twilio_account_path("AvailablePhoneNumbers/US/Local.json")))
        .and(query_param("AreaCode", "206"))
        .and(query_param("InLocality", "Seattle"))
        .and(query_param("SmsEnabled", "true"))
        .and(query_param("VoiceEnabled", "true"))
        .and(query_param("PageSize", "20"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "available_phone_numbers": [{
                "friendly_name": "(206) 555-0100",
                "phone_number": "+12065550100",
                "locality": "Seattle",
                "region": "WA",
                "postal_code": "98101",
                "capabilities": {"voice": true, "SMS": true, "MMS": false}
            }]
        })))
        .expect(1)
        .mount(&harness.server)
        .await;

    let numbers = harness
        .carrier
        .available_numbers(Provider::Twilio, "206", Some("Seattle"))
        .await
        .unwrap();

    assert_eq!(numbers.len(), 1);
    assert_eq!(numbers[0].phone_number, "+12065550100");
    assert!(numbers[0].capabilities.sms);
    assert!(numbers[0].capabilities.voice);
    assert!(!numbers[0].capabilities.mms);
}

#[tokio::test]
async fn signalwire_number_search_ignores_locality() {
    let harness = CarrierHarness::start().await.unwrap();
    Mock::given(method("GET"))
        .and(path(signalwire_account_path("AvailablePhoneNumbers/US/Local.json")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "available_phone_numbers": []
        })))
        .mount(&harness.server)
        .await;

    let numbers = harness
        .carrier
        .available_numbers(Provider::SignalWire, "206", Some("Seattle"))
        .await
        .unwrap();
    assert!(numbers.is_empty());

    let requests = requests_to(&harness, "/Local.json").await;
    let params = query(&requests[0]);
    assert_eq!(params["AreaCode"], "206");
    assert!(!params.contains_key("InLocality"));
}

#[tokio::test]
async fn purchase_binds_number_to_callback_application() {
    let harness = CarrierHarness::start().await.unwrap();
    Mock::given(method("POST"))
        .and(path(twilio_account_path("IncomingPhoneNumbers.json")))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "sid": "PN00000000000000000000000000000001",
            "phone_number": "+12065550100",
            "sms_application_sid": TEST_CALLBACK_APP_ID,
            "voice_application_sid": TEST_CALLBACK_APP_ID,
            "address_sid": TEST_ADDRESS_SID
        })))
        .mount(&harness.server)
        .await;
    Mock::given(method("POST"))
        .and(path(signalwire_account_path("IncomingPhoneNumbers.json")))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "sid": "PN00000000000000000000000000000002",
            "phone_number": "+12065550101"
        })))
        .mount(&harness.server)
        .await;

    let twilio = harness
        .carrier
        .purchase_number(Provider::Twilio, "+12065550100")
        .await
        .unwrap();
    assert_eq!(twilio.sid.as_deref(), Some("PN00000000000000000000000000000001"));
    assert_eq!(twilio.address_sid.as_deref(), Some(TEST_ADDRESS_SID));

    harness
        .carrier
        .purchase_number(Provider::SignalWire, "+12065550101")
        .await
        .unwrap();

    let requests = requests_to(&harness, "/IncomingPhoneNumbers.json").await;
    assert_eq!(requests.len(), 2);

    let twilio_form = form(&requests[0]);
    assert_eq!(twilio_form["PhoneNumber"], "+12065550100");
    assert_eq!(twilio_form["AddressSid"], TEST_ADDRESS_SID);
    assert_eq!(twilio_form["SmsApplicationSid"], TEST_CALLBACK_APP_ID);
    assert_eq!(twilio_form["VoiceApplicationSid"], TEST_CALLBACK_APP_ID);

    let signalwire_form = form(&requests[1]);
    assert_eq!(signalwire_form["PhoneNumber"], "+12065550101");
    assert!(!signalwire_form.contains_key("AddressSid"));
    assert_eq!(signalwire_form["SmsApplicationSid"], TEST_CALLBACK_APP_ID);
}

#[tokio::test]
async fn purchase_failures_propagate() {
    let harness = CarrierHarness::start().await.unwrap();
    Mock::given(method("POST"))
        .and(path(twilio_account_path("IncomingPhoneNumbers.json")))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "code": 21422,
            "message": "PhoneNumber Requested is not available"
        })))
        .mount(&harness.server)
        .await;

    let err = harness
        .carrier
        .purchase_number(Provider::Twilio, "+12065550100")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        SwitchboardError::Upstream {
            status: 400,
            code: Some(21422),
            ..
        }
    ));
}

#[tokio::test]
async fn incoming_number_requires_a_single_match() {
    let harness = CarrierHarness::start().await.unwrap();
    Mock::given(method("GET"))
        .and(path(twilio_account_path("IncomingPhoneNumbers.json")))
        .and(query_param("PhoneNumber", "+12065550100"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "incoming_phone_numbers": [
                {"sid": "PN1", "phone_number": "+12065550100", "friendly_name": "front desk"}
            ]
        })))
        .mount(&harness.server)
        .await;
    Mock::given(method("GET"))
        .and(path(twilio_account_path("IncomingPhoneNumbers.json")))
        .and(query_param("PhoneNumber", "+1206"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "incoming_phone_numbers": [
                {"sid": "PN1", "phone_number": "+12065550100"},
                {"sid": "PN2", "phone_number": "+12065550101"}
            ]
        })))
        .mount(&harness.server)
        .await;

    let exact = harness
        .carrier
        .incoming_number(Provider::Twilio, "+12065550100")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(exact.sid.as_deref(), Some("PN1"));
    assert_eq!(exact.friendly_name.as_deref(), Some("front desk"));

    let ambiguous = harness
        .carrier
        .incoming_number(Provider::Twilio, "+1206")
        .await
        .unwrap();
    assert!(ambiguous.is_none());
}

#[tokio::test]
async fn update_renames_and_rebinds_a_number() {
    let harness = CarrierHarness::start().await.unwrap();
    Mock::given(method("POST"))
        .and(path(twilio_account_path("IncomingPhoneNumbers/PN1.json")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "sid": "PN1",
            "friendly_name": "support line"
        })))
        .mount(&harness.server)
        .await;

    let updated = harness
        .carrier
        .update_incoming_number(Provider::Twilio, "PN1", "support line")
        .await
        .unwrap();
    assert_eq!(updated.friendly_name.as_deref(), Some("support line"));

    let requests = requests_to(&harness, "/PN1.json").await;
    let fields = form(&requests[0]);
    assert_eq!(fields["FriendlyName"], "support line");
    assert_eq!(fields["VoiceApplicationSid"], TEST_CALLBACK_APP_ID);
}

#[tokio::test]
async fn migrate_moves_a_number_to_the_target_account() {
    let harness = CarrierHarness::start().await.unwrap();
    Mock::given(method("POST"))
        .and(path(twilio_account_path("IncomingPhoneNumbers/PN7.json")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "sid": "PN7",
            "account_sid": TEST_MIGRATE_ACCOUNT_SID
        })))
        .expect(1)
        .mount(&harness.server)
        .await;

    let moved = harness
        .carrier
        .migrate_incoming_number(Provider::Twilio, "PN7")
        .await
        .unwrap();
    assert_eq!(moved.account_sid.as_deref(), Some(TEST_MIGRATE_ACCOUNT_SID));

    let requests = requests_to(&harness, "/PN7.json").await;
    let fields = form(&requests[0]);
    assert_eq!(fields["AccountSid"], TEST_MIGRATE_ACCOUNT_SID);
    assert_eq!(fields["AddressSid"], TEST_MIGRATE_ADDRESS_SID);
    assert!(!fields.contains_key("FriendlyName"));
}

#[tokio::test]
async fn migrate_is_rejected_for_signalwire() {
    let harness = CarrierHarness::start().await.unwrap();

    let err = harness
        .carrier
        .migrate_incoming_number(Provider::SignalWire, "PN7")
        .await
        .unwrap_err();
    assert!(matches!(err, SwitchboardError::Validation(_)));
    assert!(requests_to(&harness, "/PN7.json").await.is_empty());
}

#[tokio::test]
async fn recording_url_follows_no_redirect_and_returns_location() {
    let harness = CarrierHarness::start().await.unwrap();
    let recording = twilio_account_path("Recordings/RE1");
    Mock::given(method("HEAD"))
        .and(path(recording.clone()))
        .and(header_exists("authorization"))
        .respond_with(
            ResponseTemplate::new(302)
                .insert_header("Location", "https://media.example.com/RE1.wav"),
        )
        .expect(1)
        .mount(&harness.server)
        .await;

    let location = harness
        .carrier
        .recording_url(Provider::Twilio, &recording)
        .await
        .unwrap();
    assert_eq!(location.as_deref(), Some("https://media.example.com/RE1.wav"));
}

#[tokio::test]
async fn missing_recording_is_an_upstream_error() {
    let harness = CarrierHarness::start().await.unwrap();
    Mock::given(method("HEAD"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&harness.server)
        .await;

    let err = harness
        .carrier
        .recording_url(Provider::Twilio, &twilio_account_path("Recordings/RE404"))
        .await
        .unwrap_err();
    assert!(matches!(err, SwitchboardError::Upstream { status: 404, .. }));
}

#[tokio::test]
async fn click_to_call_rings_the_physical_phone_first() {
    let harness = CarrierHarness::start().await.unwrap();
    Mock::given(method("POST"))
        .and(path(twilio_account_path("Calls.json")))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "sid": "CA00000000000000000000000000000009",
            "status": "queued"
        })))
        .mount(&harness.server)
        .await;

    let call = harness
        .carrier
        .click_to_call(&ClickToCall {
            provider: Provider::Twilio,
            webhook_url: "https://bot.example.com/carrier/webhook".to_string(),
            physical_number: "+15550002222".to_string(),
            virtual_number: BOT_NUMBER.to_string(),
            recipient_number: "+15550001111".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(call.sid.as_deref(), Some("CA00000000000000000000000000000009"));

    let requests = requests_to(&harness, "/Calls.json").await;
    let fields = form(&requests[0]);
    assert_eq!(fields["To"], "+15550002222");
    assert_eq!(fields["From"], BOT_NUMBER);

    let answer = url::Url::parse(&fields["Url"]).unwrap();
    let answer: HashMap<String, String> = answer.query_pairs().into_owned().collect();
    assert_eq!(answer["provider"], "twilio");
    assert_eq!(answer["type"], "voice");
    assert_eq!(answer["callback_token"], TEST_CALLBACK_TOKEN);
    assert_eq!(answer["subtype"], "callback_dial");
    assert_eq!(answer["value"], "15550001111");

    let status = url::Url::parse(&fields["StatusCallback"]).unwrap();
    let status: HashMap<String, String> = status.query_pairs().into_owned().collect();
    assert_eq!(status["type"], "voice_status");
    assert_eq!(status["recipient"], "15550001111");
}

#[tokio::test]
async fn unconfigured_provider_cannot_provision() {
    let mut config = switchboard_test_utils::mock_config("http://127.0.0.1:9");
    config.signalwire.account_sid = None;
    let carrier = switchboard_carrier::Carrier::from_config(&config).unwrap();
    let err = carrier
        .available_numbers(Provider::SignalWire, "206", None)
        .await
        .unwrap_err();
    assert!(matches!(err, SwitchboardError::UnsupportedProvider(_)));
}
