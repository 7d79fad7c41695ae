//! Default configuration values

use std::path::PathBuf;

/// Default build file name (TOML)
pub const DEFAULT_CONFIG_TOML: &str = "girder.toml";

/// Default build file name (YAML)
pub const DEFAULT_CONFIG_YAML: &str = "girder.yaml";

/// Environment variable overriding the user-scoped girder directory
pub const USER_HOME_ENV: &str = "GIRDER_USER_HOME";

/// Directory below the user home holding task history records
pub const HISTORY_DIR_NAME: &str = "task-history";

/// Get list of build file names to search for, in order of preference
pub fn config_file_names() -> Vec<&'static str> {
    vec![
        DEFAULT_CONFIG_TOML,
        DEFAULT_CONFIG_YAML,
        ".girder.toml",
        ".girder.yaml",
    ]
}

/// User-scoped girder directory: `$GIRDER_USER_HOME`, else `~/.girder`
pub fn default_user_home() -> Option<PathBuf> {
    if let Some(dir) = std::env::var_os(USER_HOME_ENV).filter(|v| !v.is_empty()) {
        return Some(PathBuf::from(dir));
    }
    dirs::home_dir().map(|home| home.join(".girder"))
}

/// Starter build file (TOML)
pub const DEFAULT_CONFIG_TEMPLATE_TOML: &str = r#"# Girder build file

[build]
build_dir = "build"
plugins = ["base"]

[[projects]]
path = ":"

[[projects]]
path = ":core"

[[projects.tasks]]
name = "compile"
command = "mkdir -p build/classes && touch build/classes/.done"
outputs = ["classesDir"]

[projects.tasks.properties]
classesDir = "build/classes"

[[projects]]
path = ":app"

[projects.configurations.compile]
dependencies = [":core"]

[[projects.tasks]]
name = "compile"
command = "mkdir -p build/classes && touch build/classes/.done"
outputs = ["classesDir"]
stale_after = [":core:compile"]
depends_on_projects = [
    { task = "compile", configuration = "compile", direction = "depended-on" },
]

[projects.tasks.properties]
classesDir = "build/classes"
"#;

/// Starter build file (YAML)
pub const DEFAULT_CONFIG_TEMPLATE_YAML: &str = r#"# Girder build file

build:
  build_dir: build
  plugins: [base]

projects:
  - path: ":"

  - path: ":core"
    tasks:
      - name: compile
        command: mkdir -p build/classes && touch build/classes/.done
        outputs: [classesDir]
        properties:
          classesDir: build/classes

  - path: ":app"
    configurations:
      compile:
        dependencies: [":core"]
    tasks:
      - name: compile
        command: mkdir -p build/classes && touch build/classes/.done
        outputs: [classesDir]
        stale_after: [":core:compile"]
        depends_on_projects:
          - task: compile
            configuration: compile
            direction: depended-on
        properties:
          classesDir: build/classes
"#;
