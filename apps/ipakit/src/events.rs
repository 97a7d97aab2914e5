//! Event handling and progress display

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use ipakit_events::{AppEvent, DownloadEvent, GeneralEvent, SignatureEvent, StoreEvent};
use std::collections::HashMap;

/// Event handler for progress display and user feedback
pub struct EventHandler {
    /// Multi-progress manager for concurrent progress bars
    multi_progress: MultiProgress,
    /// Active progress bars by URL
    download_bars: HashMap<String, ProgressBar>,
    /// Suppress terminal rendering so stdout stays machine-readable
    silent: bool,
    /// Render debug events too
    verbose: bool,
}

impl EventHandler {
    /// Create new event handler
    pub fn new(silent: bool, verbose: bool) -> Self {
        Self {
            multi_progress: MultiProgress::new(),
            download_bars: HashMap::new(),
            silent,
            verbose,
        }
    }

    /// Handle incoming event
    pub fn handle_event(&mut self, event: AppEvent) {
        // JSON mode: keep stdout machine readable, route events to tracing
        if self.silent {
            match event.log_level() {
                tracing::Level::ERROR => tracing::error!(?event, "event"),
                tracing::Level::WARN => tracing::warn!(?event, "event"),
                tracing::Level::INFO => tracing::info!(?event, "event"),
                _ => tracing::debug!(?event, "event"),
            }
            return;
        }

        match event {
            AppEvent::Download(event) => self.handle_download(event),
            AppEvent::Store(event) => self.handle_store(&event),
            AppEvent::Signature(event) => self.handle_signature(&event),
            AppEvent::General(event) => self.handle_general(&event),
        }
    }

    fn handle_store(&self, event: &StoreEvent) {
        match event {
            StoreEvent::AuthenticationStarted { email } => {
                self.show_status(&format!("🔐 Signing in as {email}"));
            }
            StoreEvent::AuthenticationRetried { email } => {
                self.show_status(&format!("🔁 Retrying sign-in for {email}"));
            }
            StoreEvent::Authenticated {
                email,
                store_front: _,
            } => {
                self.show_status(&format!("✅ Signed in as {email}"));
            }
            StoreEvent::PurchaseStarted { app_id } => {
                self.show_status(&format!("🛒 Requesting a license for {app_id}"));
            }
            StoreEvent::LicenseExists { app_id } => {
                self.show_status(&format!("ℹ️  License already present for {app_id}"));
            }
            StoreEvent::Purchased { app_id } => {
                self.show_status(&format!("✅ License obtained for {app_id}"));
            }
            StoreEvent::GrantRequested { app_id } => {
                self.show_status(&format!("📦 Requesting a signed copy of {app_id}"));
            }
            StoreEvent::GrantIssued { app_id, url: _ } => {
                self.show_status(&format!("✅ Download grant issued for {app_id}"));
            }
        }
    }

    fn handle_signature(&self, event: &SignatureEvent) {
        match event {
            SignatureEvent::MetadataAppended { archive: _ } => {
                self.show_status("🧾 Wrote ownership metadata");
            }
            SignatureEvent::SignatureAppended { archive: _, entry } => {
                self.show_status(&format!("🔏 Wrote signature at {entry}"));
            }
        }
    }

    fn handle_general(&self, event: &GeneralEvent) {
        match event {
            GeneralEvent::Warning { message, context } => {
                if let Some(context) = context {
                    self.show_status(&format!("⚠️  {message} ({context})"));
                } else {
                    self.show_status(&format!("⚠️  {message}"));
                }
            }
            GeneralEvent::Error { message, details } => {
                if let Some(details) = details {
                    self.show_status(&format!("❌ {message}: {details}"));
                } else {
                    self.show_status(&format!("❌ {message}"));
                }
            }
            GeneralEvent::DebugLog {
                message,
                context: _,
            } => {
                if self.verbose {
                    self.show_status(&format!("· {message}"));
                }
            }
            GeneralEvent::OperationStarted { operation } => {
                self.show_status(&format!("🔄 {operation}"));
            }
            GeneralEvent::OperationCompleted { operation, success } => {
                if *success {
                    self.show_status(&format!("✅ {operation}"));
                } else {
                    self.show_status(&format!("❌ {operation}"));
                }
            }
            GeneralEvent::OperationFailed { operation, failure } => {
                self.show_status(&format!("❌ {operation} failed: {}", failure.message));
            }
        }
    }

    fn handle_download(&mut self, event: DownloadEvent) {
        match event {
            DownloadEvent::Started { url, total_size } => {
                self.handle_download_started(&url, total_size);
            }
            DownloadEvent::Progress {
                url,
                bytes_downloaded,
                total_bytes,
            } => {
                self.handle_download_progress(&url, bytes_downloaded, total_bytes);
            }
            DownloadEvent::Completed { url, final_size: _ } => {
                self.handle_download_completed(&url);
            }
            DownloadEvent::Failed { url, error } => {
                self.handle_download_failed(&url, &error);
            }
            DownloadEvent::ChecksumMismatch {
                url,
                expected,
                actual,
            } => {
                self.handle_download_failed(
                    &url,
                    &format!("checksum mismatch: expected {expected}, got {actual}"),
                );
            }
        }
    }

    fn handle_download_started(&mut self, url: &str, size: Option<u64>) {
        let filename = url.split('/').next_back().unwrap_or(url);

        let pb = if let Some(total) = size {
            ProgressBar::new(total)
        } else {
            ProgressBar::new_spinner()
        };

        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {bytes}/{total_bytes} {msg}")
                .unwrap()
                .progress_chars("#>-")
        );

        pb.set_message(format!("Downloading {filename}"));

        let pb = self.multi_progress.add(pb);
        self.download_bars.insert(url.to_string(), pb);
    }

    fn handle_download_progress(&mut self, url: &str, bytes_downloaded: u64, total_bytes: Option<u64>) {
        if let Some(pb) = self.download_bars.get(url) {
            if let Some(total) = total_bytes {
                pb.set_length(total);
            }
            pb.set_position(bytes_downloaded);
        }
    }

    fn handle_download_completed(&mut self, url: &str) {
        if let Some(pb) = self.download_bars.remove(url) {
            pb.finish_with_message("Downloaded");
        }
    }

    fn handle_download_failed(&mut self, url: &str, error: &str) {
        if let Some(pb) = self.download_bars.remove(url) {
            pb.finish_with_message(format!("Failed: {error}"));
        }
    }

    /// Show status message
    fn show_status(&self, message: &str) {
        // Use multi_progress to avoid interfering with progress bars
        self.multi_progress.println(message).unwrap_or(());
    }
}
