// src/tasks/serve.rs

use crate::config::ServerSection;
use crate::engine::action::{TaskAction, TaskContext, TaskFuture};
use crate::server::DevServer;
use crate::tasks::layout;

/// Long-lived: serves `app/` with live reload until cancelled.
#[derive(Debug)]
pub struct ServeTask {
    options: ServerSection,
}

impl ServeTask {
    pub fn new(options: ServerSection) -> Self {
        Self { options }
    }
}

impl TaskAction for ServeTask {
    fn run<'a>(&'a self, ctx: TaskContext<'a>) -> TaskFuture<'a> {
        Box::pin(async move {
            let server = DevServer::new(ctx.build.root().join(layout::APP_DIR), self.options.clone());
            server.run(ctx.cancel).await
        })
    }
}
