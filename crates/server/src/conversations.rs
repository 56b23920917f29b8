//! Conversation rollups: one summary per counterpart, newest first.

use std::collections::HashSet;

use futures::TryStreamExt;

use crate::directory::UserDirectory;
use crate::error::Result;
use crate::models::ConversationSummary;
use crate::store::MessageStore;

/// Reduce a user's full message history into at most `limit` per-counterpart
/// summaries, each carrying the latest exchanged message and the count of
/// that counterpart's unread messages, ranked newest first.
///
/// Counterparts missing from the user directory are skipped.
pub async fn latest_conversations(
    store: &MessageStore,
    directory: &UserDirectory,
    username: &str,
    limit: usize,
) -> Result<Vec<ConversationSummary>> {
    let mut summaries = Vec::new();
    if limit == 0 {
        return Ok(summaries);
    }

    let mut seen = HashSet::new();
    let mut history = store.all_involving(username);

    // The scan is newest-first, so the first message naming a counterpart is
    // necessarily that conversation's latest.
    while let Some(message) = history.try_next().await? {
        let counterpart = if message.sender == username {
            &message.receiver
        } else {
            &message.sender
        };
        if !seen.insert(counterpart.clone()) {
            continue;
        }

        let Some(profile) = directory.profile(counterpart).await? else {
            continue;
        };
        let unread_count = store.count_unread(counterpart, username).await?;

        summaries.push(ConversationSummary {
            user_id: profile.user_id,
            username: profile.username,
            profile_pic: profile.avatar_url.unwrap_or_default(),
            last_message: message.content,
            timestamp: message.timestamp,
            unread_count,
        });

        if summaries.len() >= limit {
            break;
        }
    }
    drop(history);

    // The scan order already yields this ranking, but iteration order is not
    // a contract of the store, so rank explicitly. Ties break on username.
    summaries.sort_by(|a, b| {
        b.timestamp
            .cmp(&a.timestamp)
            .then_with(|| a.username.cmp(&b.username))
    });

    Ok(summaries)
}
