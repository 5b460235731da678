// Copyright 2025 Chris Custine
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

use thiserror::Error;

use crate::marker::MarkerId;

/// Errors from marker and popup operations.
///
/// None of these are fatal. Callers log them and carry on.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BoardError {
    #[error("no marker with id {0}")]
    UnknownMarker(MarkerId),

    #[error("comment for marker {0} was already saved")]
    AlreadySaved(MarkerId),

    #[error("comment editor for marker {0} is not open")]
    EditorNotOpen(MarkerId),
}
