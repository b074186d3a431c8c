//! Shared test utilities: an in-memory `GarminClient` and a scripted prompter.
#![cfg(test)]

use crate::credentials::Prompter;
use async_trait::async_trait;
use garmin_connect_client::{
    ActivitySummary, ActivityType, DownloadFormat, GarminClient, GarminError,
};
use secrecy::SecretString;
use std::collections::{HashMap, VecDeque};
use std::io;
use std::sync::Mutex;

pub fn activity(id: u64, name: &str, category: Option<&str>) -> ActivitySummary {
    ActivitySummary {
        activity_id: Some(id),
        activity_name: Some(name.to_string()),
        activity_type: category.map(|c| ActivityType {
            type_key: Some(c.to_string()),
        }),
        start_time_local: None,
    }
}

/// Serves a fixed activity history and records every call.
#[derive(Default)]
pub struct FakeClient {
    activities: Vec<ActivitySummary>,
    fail_listing_at: Option<u32>,
    page_cap: Option<u32>,
    download_failures: Mutex<HashMap<u64, GarminError>>,
    page_requests: Mutex<Vec<(u32, u32)>>,
    downloads: Mutex<Vec<u64>>,
}

impl FakeClient {
    pub fn new(activities: Vec<ActivitySummary>) -> Self {
        Self {
            activities,
            ..Default::default()
        }
    }

    pub fn fail_listing_at(mut self, start: u32) -> Self {
        self.fail_listing_at = Some(start);
        self
    }

    /// Return at most `cap` records per listing call, whatever was asked for.
    pub fn page_cap(mut self, cap: u32) -> Self {
        self.page_cap = Some(cap);
        self
    }

    pub fn fail_download(self, activity_id: u64, error: GarminError) -> Self {
        self.download_failures
            .lock()
            .unwrap()
            .insert(activity_id, error);
        self
    }

    /// Bytes served for an activity.
    pub fn payload_for(activity_id: u64) -> Vec<u8> {
        format!("FIT-{activity_id}").into_bytes()
    }

    pub fn page_requests(&self) -> Vec<(u32, u32)> {
        self.page_requests.lock().unwrap().clone()
    }

    pub fn downloads(&self) -> Vec<u64> {
        self.downloads.lock().unwrap().clone()
    }
}

#[async_trait]
impl GarminClient for FakeClient {
    async fn get_activities(
        &self,
        start: u32,
        limit: u32,
    ) -> Result<Vec<ActivitySummary>, GarminError> {
        self.page_requests.lock().unwrap().push((start, limit));
        if self.fail_listing_at == Some(start) {
            return Err(GarminError::Api {
                status: 500,
                body: "listing failed".into(),
            });
        }
        let limit = self.page_cap.map_or(limit, |cap| limit.min(cap));
        Ok(self
            .activities
            .iter()
            .skip(start as usize)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn download_activity(
        &self,
        activity_id: u64,
        _format: DownloadFormat,
    ) -> Result<Vec<u8>, GarminError> {
        self.downloads.lock().unwrap().push(activity_id);
        if let Some(error) = self.download_failures.lock().unwrap().remove(&activity_id) {
            return Err(error);
        }
        Ok(Self::payload_for(activity_id))
    }
}

/// Answers prompts from fixed queues.
#[derive(Default)]
pub struct ScriptedPrompter {
    lines: VecDeque<String>,
    hidden: VecDeque<String>,
    prompts: usize,
}

impl ScriptedPrompter {
    pub fn new<const L: usize, const H: usize>(lines: [&str; L], hidden: [&str; H]) -> Self {
        Self {
            lines: lines.iter().map(|s| s.to_string()).collect(),
            hidden: hidden.iter().map(|s| s.to_string()).collect(),
            prompts: 0,
        }
    }

    pub fn prompts(&self) -> usize {
        self.prompts
    }
}

impl Prompter for ScriptedPrompter {
    fn prompt_line(&mut self, _prompt: &str) -> io::Result<String> {
        self.prompts += 1;
        Ok(self.lines.pop_front().unwrap_or_default())
    }

    fn prompt_hidden(&mut self, _prompt: &str) -> io::Result<SecretString> {
        self.prompts += 1;
        let answer = self.hidden.pop_front().unwrap_or_default();
        Ok(SecretString::new(answer.into()))
    }
}
