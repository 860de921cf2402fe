//! Shareable interview links and the invitation texts sent with them.

use reqwest::Url;
use serde::Serialize;

use crate::errors::AppError;

pub const INVITATION_SUBJECT: &str = "AI Interview Invitation";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShareLinks {
    pub link: String,
    pub email: String,
    pub whatsapp: String,
}

/// `{host}/{interview_id}`, tolerant of a trailing slash on the host.
pub fn interview_link(host_url: &str, interview_id: &str) -> String {
    format!("{}/{}", host_url.trim_end_matches('/'), interview_id)
}

pub fn invitation_message(link: &str) -> String {
    format!("You're invited to complete an AI-powered interview. Please use this link: {link}")
}

pub fn share_links(host_url: &str, interview_id: &str) -> Result<ShareLinks, AppError> {
    let link = interview_link(host_url, interview_id);
    let message = invitation_message(&link);

    let mut email = Url::parse("mailto:")
        .map_err(|e| AppError::Internal(anyhow::anyhow!("mailto url: {e}")))?;
    email
        .query_pairs_mut()
        .append_pair("subject", INVITATION_SUBJECT)
        .append_pair("body", &message);

    let mut whatsapp = Url::parse("https://wa.me/")
        .map_err(|e| AppError::Internal(anyhow::anyhow!("whatsapp url: {e}")))?;
    whatsapp.query_pairs_mut().append_pair("text", &message);

    Ok(ShareLinks {
        link,
        email: email.into(),
        whatsapp: whatsapp.into(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interview_link_joins_host_and_id() {
        assert_eq!(
            interview_link("https://hire.example/interview/", "abc123"),
            "https://hire.example/interview/abc123"
        );
    }

    #[test]
    fn test_share_links_encode_message() {
        let links = share_links("https://hire.example/interview", "abc123").unwrap();
        assert_eq!(links.link, "https://hire.example/interview/abc123");
        assert!(links.email.starts_with("mailto:?subject=AI+Interview+Invitation&body="));
        assert!(links.whatsapp.starts_with("https://wa.me/?text=You%27re+invited"));
        assert!(links
            .whatsapp
            .contains("https%3A%2F%2Fhire.example%2Finterview%2Fabc123"));
    }
}
