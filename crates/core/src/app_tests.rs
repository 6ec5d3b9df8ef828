// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn new_sets_name_paths_and_profile() {
    let app = AppDescriptor::new(
        "echoer",
        "/usr/bin/echoer",
        "/var/run/echoer.sock",
        Profile::default(),
    );
    assert_eq!(app.name.as_str(), "echoer");
    assert_eq!(app.executable, PathBuf::from("/usr/bin/echoer"));
    assert_eq!(app.endpoint, PathBuf::from("/var/run/echoer.sock"));
    assert!(app.env.is_empty());
}

#[test]
fn with_env_replaces_environment_map() {
    let mut env = HashMap::new();
    env.insert("FOO".to_string(), "bar".to_string());
    let app = AppDescriptor::new("echoer", "/bin/echoer", "/tmp/echoer.sock", Profile::default())
        .with_env(env.clone());
    assert_eq!(app.env, env);
}
