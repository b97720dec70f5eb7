//! Views and renderers.
//!
//! A view is a pure function of the model that yields an [`Html`] value.
//! `Html` is itself a function from a [`Dispatch`] to the renderer's `Dom`
//! type, so event handlers inside the view can be wired to the running
//! program without the view ever seeing the program.  The runtime never
//! inspects `Dom`; it only hands each one to a [`Renderer`].

use crate::command::Command;
use crate::program::{Dispatch, Program};
use crate::runtime::{self, ProgramError};
use crate::subscription::Subscription;
use futures::stream::BoxStream;
use futures::StreamExt;
use std::fmt;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// A view waiting for a dispatch: `Dispatch<Msg> -> Dom`.
pub struct Html<Dom, Msg> {
    build: Box<dyn FnOnce(&Dispatch<Msg>) -> Dom + Send>,
}

impl<Dom, Msg> fmt::Debug for Html<Dom, Msg> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Html").finish_non_exhaustive()
    }
}

impl<Dom: 'static, Msg: 'static> Html<Dom, Msg> {
    /// Wrap a function that builds the `Dom` once it knows where to dispatch.
    pub fn new(build: impl FnOnce(&Dispatch<Msg>) -> Dom + Send + 'static) -> Self {
        Self {
            build: Box::new(build),
        }
    }

    /// A view that ignores dispatch.
    pub fn constant(dom: Dom) -> Self
    where
        Dom: Send,
    {
        Html::new(move |_| dom)
    }

    /// Produce the `Dom`, wiring its handlers to `dispatch`.
    pub fn into_dom(self, dispatch: &Dispatch<Msg>) -> Dom {
        (self.build)(dispatch)
    }

    /// Embed a child view in a parent whose messages wrap the child's.
    pub fn map<Parent: 'static>(
        self,
        f: impl Fn(Msg) -> Parent + Send + Sync + 'static,
    ) -> Html<Dom, Parent> {
        Html::new(move |dispatch: &Dispatch<Parent>| self.into_dom(&dispatch.contramap(f)))
    }
}

/// Consumes each `Dom` produced by the view.
pub trait Renderer<Dom> {
    fn render(&mut self, dom: Dom);
}

impl<Dom, F: FnMut(Dom)> Renderer<Dom> for F {
    fn render(&mut self, dom: Dom) {
        self(dom)
    }
}

type ViewFn<Model, Dom, Msg> = Arc<dyn Fn(&Model) -> Html<Dom, Msg> + Send + Sync>;

/// A [`Program`] together with its `view`.
pub struct HtmlProgram<Model, Msg, Dom> {
    program: Program<Model, Msg>,
    view: ViewFn<Model, Dom, Msg>,
}

impl<Model, Msg, Dom> Clone for HtmlProgram<Model, Msg, Dom> {
    fn clone(&self) -> Self {
        Self {
            program: self.program.clone(),
            view: Arc::clone(&self.view),
        }
    }
}

impl<Model, Msg, Dom> HtmlProgram<Model, Msg, Dom>
where
    Model: Clone + PartialEq + Send + 'static,
    Msg: Send + 'static,
    Dom: Send + 'static,
{
    pub fn new(
        init: (Model, Command<Msg>),
        update: impl Fn(Msg, &Model) -> (Model, Command<Msg>) + Send + Sync + 'static,
        view: impl Fn(&Model) -> Html<Dom, Msg> + Send + Sync + 'static,
    ) -> Self {
        Self::from_program(Program::new(init, update), view)
    }

    /// Attach a view to an existing program.
    pub fn from_program(
        program: Program<Model, Msg>,
        view: impl Fn(&Model) -> Html<Dom, Msg> + Send + Sync + 'static,
    ) -> Self {
        Self {
            program,
            view: Arc::new(view),
        }
    }

    pub fn with_subscriptions(
        mut self,
        subscriptions: impl Fn(&Model) -> Subscription<Msg> + Send + Sync + 'static,
    ) -> Self {
        self.program = self.program.with_subscriptions(subscriptions);
        self
    }

    pub fn with_stop(mut self, signal: CancellationToken) -> Self {
        self.program = self.program.with_stop(signal);
        self
    }

    pub fn program(&self) -> &Program<Model, Msg> {
        &self.program
    }

    /// `html$`: one view per distinct model.
    pub fn html_stream(&self) -> BoxStream<'static, Html<Dom, Msg>> {
        self.views(self.program.model_stream())
    }

    fn views(&self, models: BoxStream<'static, Model>) -> BoxStream<'static, Html<Dom, Msg>> {
        let view = Arc::clone(&self.view);
        models.map(move |model| view(&model)).boxed()
    }
}

/// Run `program` and hand every rendered view to `renderer`.
///
/// Returns the render loop's task; it finishes (dropping the renderer) once
/// the program's stop signal fires.
pub fn run<Model, Msg, Dom, R>(
    program: &HtmlProgram<Model, Msg, Dom>,
    mut renderer: R,
) -> Result<JoinHandle<()>, ProgramError>
where
    Model: Clone + PartialEq + Send + 'static,
    Msg: Send + 'static,
    Dom: Send + 'static,
    R: Renderer<Dom> + Send + 'static,
{
    let mut views = program.views(runtime::run(&program.program)?);
    let dispatch = program.program.dispatcher();
    Ok(tokio::spawn(async move {
        while let Some(html) = views.next().await {
            renderer.render(html.into_dom(&dispatch));
        }
        tracing::debug!("render loop finished");
    }))
}
