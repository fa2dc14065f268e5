mod matching;
mod naming;
mod run;

pub(crate) use run::run;
