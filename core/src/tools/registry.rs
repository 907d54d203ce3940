//! Tool registry for managing available tools

use crate::tools::builtin::{
    CalculateToolFactory, InspireToolFactory, NoteToolFactory, NotesStore, NowToolFactory,
};
use crate::tools::{Tool, ToolExecutor};
use std::collections::HashMap;
use std::path::PathBuf;

/// Registry for managing tool creation and registration
pub struct ToolRegistry {
    factories: HashMap<String, Box<dyn ToolFactory>>,
}

/// Factory trait for creating tools
pub trait ToolFactory: Send + Sync {
    /// Create a new instance of the tool
    fn create(&self) -> Box<dyn Tool>;

    /// Get the name of the tool this factory creates
    fn tool_name(&self) -> &str;

    /// Get the description of the tool this factory creates
    fn tool_description(&self) -> &str;
}

impl ToolRegistry {
    /// Create an empty tool registry
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Registry with every built-in tool, storing notes under `notes_dir`
    pub fn with_notes_dir<P: Into<PathBuf>>(notes_dir: P) -> Self {
        let store = NotesStore::new(notes_dir);
        let mut registry = Self::new();

        registry.register_factory(Box::new(CalculateToolFactory));
        registry.register_factory(Box::new(NowToolFactory));
        registry.register_factory(Box::new(NoteToolFactory::save(store.clone())));
        registry.register_factory(Box::new(NoteToolFactory::find(store)));
        registry.register_factory(Box::new(InspireToolFactory));

        registry
    }

    /// Register a tool factory
    pub fn register_factory(&mut self, factory: Box<dyn ToolFactory>) {
        self.factories
            .insert(factory.tool_name().to_string(), factory);
    }

    /// Create a tool by name
    pub fn create_tool(&self, name: &str) -> Option<Box<dyn Tool>> {
        self.factories.get(name).map(|factory| factory.create())
    }

    /// List all available tool names, sorted
    pub fn list_tools(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    /// Get tool information
    pub fn get_tool_info(&self, name: &str) -> Option<(&str, &str)> {
        self.factories
            .get(name)
            .map(|factory| (factory.tool_name(), factory.tool_description()))
    }

    /// Create a tool executor with the specified tools; unknown names are skipped
    pub fn create_executor(&self, tool_names: &[&str]) -> ToolExecutor {
        let mut executor = ToolExecutor::new();

        for name in tool_names {
            if let Some(tool) = self.create_tool(name) {
                executor.register_tool(tool);
            } else {
                tracing::warn!("Unknown tool requested: {}", name);
            }
        }

        executor
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::with_notes_dir("notes")
    }
}

/// Macro to help implement tool factories
#[macro_export]
macro_rules! impl_tool_factory {
    ($factory:ident, $tool:ident, $name:expr, $description:expr) => {
        pub struct $factory;

        impl $crate::tools::ToolFactory for $factory {
            fn create(&self) -> Box<dyn $crate::tools::Tool> {
                Box::new($tool::new())
            }

            fn tool_name(&self) -> &str {
                $name
            }

            fn tool_description(&self) -> &str {
                $description
            }
        }
    };
}
