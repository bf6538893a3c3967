//! Fans a message body out to every valid recipient through one session.

use log::{debug, error, info, warn};

use crate::session::Gateway;
use crate::types::{DeliveryType, DispatchConfig, InvalidReason, Outcome};
use crate::validator::is_valid_number;

/// Sends `payload` to every number in `config.to`.
///
/// Malformed numbers are skipped. The first error from the API aborts the
/// remaining sends; messages already sent stay sent. The session opened here
/// is dropped before returning on every path.
pub async fn dispatch(
    gateway: &dyn Gateway,
    dispatch_id: &str,
    payload: &[u8],
    config: &DispatchConfig,
) -> Outcome {
    let delivery_type = match config.delivery_type.parse::<DeliveryType>() {
        Ok(kind) => kind,
        Err(err) => {
            error!("[{}] {}", dispatch_id, err);
            return Outcome::Invalid(InvalidReason::UnsupportedDeliveryType(
                config.delivery_type.clone(),
            ));
        }
    };

    let body = String::from_utf8_lossy(payload);
    if body.is_empty() {
        error!("[{}] Message body cannot be empty", dispatch_id);
        return Outcome::Invalid(InvalidReason::EmptyBody);
    }

    let session = match gateway.open(&config.account_sid, &config.auth_token) {
        Ok(session) => session,
        Err(err) => {
            error!("[{}] Message wasn't sent: {}", dispatch_id, err);
            return Outcome::Failed {
                sent: 0,
                error: err.to_string(),
            };
        }
    };

    let from = delivery_type.address(&config.from);
    let numbers: Vec<&str> = config.to.split(',').collect();
    let mut skipped = Vec::new();
    let mut sent = 0;

    for number in &numbers {
        if !is_valid_number(number) {
            skipped.push(number.to_string());
            continue;
        }

        let to = delivery_type.address(number);
        match session.send_message(&to, &from, &body).await {
            Ok(message) => {
                debug!(
                    "[{}] Sent {} to {} ({})",
                    dispatch_id,
                    message.sid,
                    to,
                    message.status.as_deref().unwrap_or("unknown")
                );
                sent += 1;
            }
            Err(err) => {
                error!(
                    "[{}] Message wasn't sent to {} ({} already sent): {}",
                    dispatch_id, to, sent, err
                );
                return Outcome::Failed {
                    sent,
                    error: err.to_string(),
                };
            }
        }
    }
    drop(session);

    if skipped.len() == numbers.len() {
        error!("[{}] Message wasn't sent. All numbers are not valid", dispatch_id);
        Outcome::Invalid(InvalidReason::NoValidRecipients(skipped))
    } else if skipped.is_empty() {
        info!("[{}] Message was sent successfully to all {} numbers", dispatch_id, sent);
        Outcome::Sent { sent }
    } else {
        warn!(
            "[{}] Message was sent, but some numbers were not valid: {}",
            dispatch_id,
            skipped.join(",")
        );
        Outcome::PartiallySent { sent, skipped }
    }
}
