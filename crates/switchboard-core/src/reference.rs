// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation reference projection and re-application.
//!
//! A reference is derived from any activity without side effects and later
//! stamped onto outgoing (reply) or synthetic incoming activities.

use crate::types::{Activity, ConversationReference, ResourceResponse};

/// Projects the addressing of `activity` into a standalone reference.
///
/// The account and conversation records are cloned, so mutating the
/// reference never reaches back into the source activity.
pub fn get_conversation_reference(activity: &Activity) -> ConversationReference {
    ConversationReference {
        activity_id: activity.id.clone(),
        user: activity.from.clone(),
        bot: activity.recipient.clone(),
        conversation: activity.conversation.clone(),
        channel_id: activity.channel_id.clone(),
        service_url: activity.service_url.clone(),
    }
}

/// Stamps delivery information from `reference` onto `activity` and returns it.
///
/// `is_incoming` maps `user -> from, bot -> recipient` and moves the
/// reference's activity id into `id`. The outgoing direction swaps the
/// parties and moves the activity id into `reply_to_id`.
pub fn apply_conversation_reference(
    mut activity: Activity,
    reference: &ConversationReference,
    is_incoming: bool,
) -> Activity {
    activity.channel_id = reference.channel_id.clone();
    activity.service_url = reference.service_url.clone();
    activity.conversation = reference.conversation.clone();

    if is_incoming {
        activity.from = reference.user.clone();
        activity.recipient = reference.bot.clone();
        if let Some(id) = &reference.activity_id {
            activity.id = Some(id.clone());
        }
    } else {
        activity.from = reference.bot.clone();
        activity.recipient = reference.user.clone();
        if let Some(id) = &reference.activity_id {
            activity.reply_to_id = Some(id.clone());
        }
    }

    activity
}

/// Reference for `activity` that points at the reply described by `reply`,
/// so the sent message can later be targeted directly.
pub fn get_reply_conversation_reference(
    activity: &Activity,
    reply: &ResourceResponse,
) -> ConversationReference {
    let mut reference = get_conversation_reference(activity);
    reference.activity_id = reply.id.clone();
    reference
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ActivityType, ChannelAccount, ConversationAccount};

    fn inbound() -> Activity {
        Activity {
            activity_type: ActivityType::Message,
            id: Some("SM1".into()),
            channel_id: Some("twilio".into()),
            conversation: Some(ConversationAccount::new("AC1")),
            from: Some(ChannelAccount::new("+15551234567")),
            recipient: Some(ChannelAccount::new("+15557654321")),
            text: Some("hello".into()),
            service_url: Some("https://api.twilio.com/2010-04-01".into()),
            ..Activity::default()
        }
    }

    #[test]
    fn reference_copies_addressing() {
        let activity = inbound();
        let reference = get_conversation_reference(&activity);
        assert_eq!(reference.activity_id.as_deref(), Some("SM1"));
        assert_eq!(reference.user.as_ref().unwrap().id, "+15551234567");
        assert_eq!(reference.bot.as_ref().unwrap().id, "+15557654321");
        assert_eq!(reference.channel_id.as_deref(), Some("twilio"));
    }

    #[test]
    fn mutating_reference_leaves_activity_untouched() {
        let activity = inbound();
        let mut reference = get_conversation_reference(&activity);
        reference.user.as_mut().unwrap().id = "+10000000000".into();
        reference.conversation.as_mut().unwrap().tenant_id = "AC9".into();
        assert_eq!(activity.from_id(), Some("+15551234567"));
        assert_eq!(activity.tenant_id(), Some("AC1"));
    }

    #[test]
    fn outgoing_application_swaps_parties() {
        let original = inbound();
        let reference = get_conversation_reference(&original);
        let reply = apply_conversation_reference(Activity::message("pong"), &reference, false);

        assert_eq!(reply.channel_id, original.channel_id);
        assert_eq!(reply.service_url, original.service_url);
        assert_eq!(reply.conversation, original.conversation);
        assert_eq!(reply.from, original.recipient);
        assert_eq!(reply.recipient, original.from);
        assert_eq!(reply.reply_to_id.as_deref(), Some("SM1"));
        assert!(reply.id.is_none());
    }

    #[test]
    fn incoming_application_keeps_parties() {
        let original = inbound();
        let reference = get_conversation_reference(&original);
        let event = apply_conversation_reference(Activity::event("continueConversation"), &reference, true);

        assert_eq!(event.from, original.from);
        assert_eq!(event.recipient, original.recipient);
        assert_eq!(event.id.as_deref(), Some("SM1"));
        assert!(event.reply_to_id.is_none());
    }

    #[test]
    fn missing_activity_id_sets_neither_field() {
        let mut reference = get_conversation_reference(&inbound());
        reference.activity_id = None;
        let out = apply_conversation_reference(Activity::message("x"), &reference, false);
        assert!(out.id.is_none());
        assert!(out.reply_to_id.is_none());
    }

    #[test]
    fn reply_reference_points_at_reply() {
        let reference =
            get_reply_conversation_reference(&inbound(), &ResourceResponse::with_id("SM2"));
        assert_eq!(reference.activity_id.as_deref(), Some("SM2"));
        assert_eq!(reference.user.unwrap().id, "+15551234567");
    }
}
