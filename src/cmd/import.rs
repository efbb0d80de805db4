// Copyright 2025 Fernando Borretti
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

use std::path::PathBuf;

use crate::collection::Collection;
use crate::error::Fallible;
use crate::import::import_path;
use crate::types::timestamp::Timestamp;

pub fn import_decks(directory: Option<String>, path: String) -> Fallible<()> {
    let coll = Collection::new(directory)?;
    let path = PathBuf::from(path);
    let summaries = import_path(&coll.db, &path, Timestamp::now())?;
    if summaries.is_empty() {
        println!("No deck files found.");
    }
    for summary in summaries {
        println!(
            "{}: {} added, {} skipped.",
            summary.deck_name, summary.added, summary.skipped
        );
    }
    Ok(())
}
