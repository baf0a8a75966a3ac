// Links every module crate so its `inventory` registrator is visible to
// `ModuleCatalog::discover()`. Add new modules here.
#![allow(unused_imports)]

use greeter as _;
use kv_store as _;
