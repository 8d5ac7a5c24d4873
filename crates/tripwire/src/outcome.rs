// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

/// The outcome of one completed call to a protected resource.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Outcome {
    /// The call completed successfully.
    Success,
    /// The call failed and counts toward the error rate.
    Failure,
}
