// Copyright 2025 Lablup Inc. and Jeongkyu Shin
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use std::time::Duration;

const PROGRESS_BAR_TICK_RATE_MS: u64 = 80;
const MAX_PREFIX_WIDTH: usize = 24;

pub(crate) fn create_progress_style() -> ProgressStyle {
    ProgressStyle::with_template("{prefix:.bold} {spinner:.cyan} {msg}")
        .map(|style| style.tick_chars("⣾⣽⣻⢿⡿⣟⣯⣷ "))
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}

fn format_prefix(label: &str) -> String {
    if label.chars().count() > MAX_PREFIX_WIDTH {
        let head: String = label.chars().take(MAX_PREFIX_WIDTH - 3).collect();
        format!("[{head}...]")
    } else {
        format!("[{label}]")
    }
}

/// One spinner per row while a batch runs; nothing at all when hidden.
#[derive(Clone)]
pub struct BatchProgress {
    multi: Option<MultiProgress>,
    style: ProgressStyle,
}

impl Default for BatchProgress {
    fn default() -> Self {
        Self::hidden()
    }
}

impl BatchProgress {
    pub fn visible() -> Self {
        Self {
            multi: Some(MultiProgress::new()),
            style: create_progress_style(),
        }
    }

    pub fn hidden() -> Self {
        Self {
            multi: None,
            style: create_progress_style(),
        }
    }

    pub fn is_visible(&self) -> bool {
        self.multi.is_some()
    }

    pub(crate) fn start(&self, label: &str, message: &str) -> ProgressBar {
        let Some(multi) = &self.multi else {
            return ProgressBar::hidden();
        };

        let pb = multi.add(ProgressBar::new_spinner());
        pb.set_style(self.style.clone());
        pb.set_prefix(format_prefix(label));
        pb.set_message(format!("{}", message.cyan()));
        pb.enable_steady_tick(Duration::from_millis(PROGRESS_BAR_TICK_RATE_MS));
        pb
    }

    pub(crate) fn finish(pb: &ProgressBar, success: bool, message: &str) {
        if success {
            pb.finish_with_message(format!("{} {}", "✓".green(), message));
        } else {
            pb.finish_with_message(format!("{} {}", "✗".red(), message));
        }
    }
}
