// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod accounts;
pub mod income;
pub mod expenses;
pub mod settings;
pub mod budget;
pub mod groups;
pub mod categories;
pub mod snapshots;
pub mod networth;
pub mod goals;
pub mod seed;
pub mod importer;
pub mod exporter;
pub mod doctor;
