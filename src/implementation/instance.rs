// Copyright 2020 Xavier Gillard
//
// Permission is hereby granted, free of charge, to any person obtaining a copy of
// this software and associated documentation files (the "Software"), to deal in
// the Software without restriction, including without limitation the rights to
// use, copy, modify, merge, publish, distribute, sublicense, and/or sell copies of
// the Software, and to permit persons to whom the Software is furnished to do so,
// subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in all
// copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY, FITNESS
// FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR
// COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER
// IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN
// CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

//! The raw, on-disk shape of a problem instance. This is the exact json
//! layout the wants parser emits and the solve entry point loads back; the
//! normaliser turns it into the typed `Instance`.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::Error;

/// One participant of the raw instance: the map from each offered item id to
/// its wishlist (priority order, first entry = most wanted).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawUser {
    #[serde(default)]
    pub offers: BTreeMap<String, Vec<String>>,
}

/// One item of the raw instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawItem {
    pub owner: String,
    pub name: String,
}

/// The raw problem instance: a `users` map and an `items` map, exactly as
/// found in the instance files. Keys serialise in lexicographic order so
/// that emitting the same instance twice produces byte-identical files.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawInstance {
    #[serde(default)]
    pub users: BTreeMap<String, RawUser>,
    #[serde(default)]
    pub items: BTreeMap<String, RawItem>,
}

/// Loads a raw instance from a json file. A missing or malformed file is a
/// fatal error.
pub fn load_instance<P: AsRef<Path>>(path: P) -> Result<RawInstance, Error> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    Ok(serde_json::from_reader(reader)?)
}

/// Writes a raw instance to a json file (pretty printed, stable key order).
pub fn save_instance<P: AsRef<Path>>(path: P, instance: &RawInstance) -> Result<(), Error> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    Ok(serde_json::to_writer_pretty(writer, instance)?)
}

// ############################################################################
// #### TESTS #################################################################
// ############################################################################
