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

use owo_colors::OwoColorize;

use crate::operations::Fleet;
use crate::ui::OutputFormatter;

pub async fn list_sessions(fleet: &Fleet) {
    let sessions = fleet.list_active_connections().await;
    print!("{}", OutputFormatter::format_sessions(&sessions));
    if sessions.is_empty() {
        println!();
    }
}

pub async fn disconnect_all(fleet: &Fleet) -> usize {
    let removed = fleet.disconnect_all().await;
    if removed > 0 {
        println!(
            "{} Disconnected {} session(s)",
            "✓".green(),
            removed.to_string().bold()
        );
    } else {
        println!("{}", "No active sessions to disconnect".dimmed());
    }
    removed
}
