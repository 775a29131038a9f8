use anyhow::{Context, Result, anyhow};
use dashmap::DashMap;
use log::{debug, trace, warn};
use oxc_allocator::Allocator;
use oxc_ast::ast::*;
use oxc_ast_visit::{Visit, walk};
use oxc_parser::{Parser as OxcParser, ParserReturn};
use oxc_span::SourceType;
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::types::{SpecKind, Specifier};

/// Module requests of `file`, read from disk once and cached.
pub fn imports_for(
    file: &Path,
    cache: &DashMap<PathBuf, Vec<Specifier>>,
) -> Result<Vec<Specifier>> {
    if let Some(v) = cache.get(file) {
        trace!("Cache hit for imports: {}", file.display());
        return Ok(v.clone());
    }
    let src =
        fs::read_to_string(file).with_context(|| format!("Failed to read {}", file.display()))?;
    let specs = parse_imports(file, &src)?;
    cache.insert(file.to_path_buf(), specs.clone());
    Ok(specs)
}

/// Extracts module requests from `src` in source order.
///
/// Type-only imports and re-exports are skipped since they vanish at runtime.
pub fn parse_imports(file: &Path, src: &str) -> Result<Vec<Specifier>> {
    trace!("Parsing {} for imports", file.display());
    let allocator = Allocator::default();
    let ParserReturn { program, errors, panicked, .. } =
        OxcParser::new(&allocator, src, source_type_for(file)).parse();

    if panicked {
        return Err(anyhow!("Failed to parse {}: {} errors", file.display(), errors.len()));
    }
    if !errors.is_empty() {
        warn!("{} parse errors in {}, imports may be incomplete", errors.len(), file.display());
    }

    let mut collector = ImportCollector::default();
    collector.visit_program(&program);

    debug!("Found {} import specifiers in {}", collector.specs.len(), file.display());
    Ok(collector.specs)
}

/// Collects module requests anywhere in the tree, including `require` calls
/// nested in functions and blocks.
#[derive(Default)]
struct ImportCollector {
    specs: Vec<Specifier>,
}

impl ImportCollector {
    fn push(&mut self, request: &str, kind: SpecKind) {
        trace!("Found {:?} request '{}'", kind, request);
        self.specs.push(Specifier::new(request, kind));
    }
}

impl<'a> Visit<'a> for ImportCollector {
    fn visit_import_declaration(&mut self, decl: &ImportDeclaration<'a>) {
        if decl.import_kind.is_type() {
            return;
        }
        // `import { type A } from 'x'` is erased unless something else is
        // imported at runtime. Bare `import 'x'` always stays.
        let runtime = decl.specifiers.as_ref().is_none_or(|specifiers| {
            specifiers.iter().any(|spec| match spec {
                ImportDeclarationSpecifier::ImportSpecifier(s) => !s.import_kind.is_type(),
                _ => true,
            })
        });
        if runtime {
            self.push(&decl.source.value, SpecKind::Static);
        }
    }

    fn visit_export_all_declaration(&mut self, decl: &ExportAllDeclaration<'a>) {
        if !decl.export_kind.is_type() {
            self.push(&decl.source.value, SpecKind::Static);
        }
    }

    fn visit_export_named_declaration(&mut self, decl: &ExportNamedDeclaration<'a>) {
        if decl.export_kind.is_type() {
            return;
        }
        if let Some(source) = &decl.source {
            self.push(&source.value, SpecKind::Static);
        }
        walk::walk_export_named_declaration(self, decl);
    }

    fn visit_call_expression(&mut self, call: &CallExpression<'a>) {
        if let Expression::Identifier(callee) = &call.callee
            && callee.name.as_str() == "require"
            && let Some(Expression::StringLiteral(sl)) =
                call.arguments.first().and_then(|arg| arg.as_expression())
        {
            self.push(&sl.value, SpecKind::Static);
        }
        walk::walk_call_expression(self, call);
    }

    fn visit_import_expression(&mut self, expr: &ImportExpression<'a>) {
        if let Expression::StringLiteral(sl) = &expr.source {
            self.push(&sl.value, SpecKind::Dynamic);
        }
        walk::walk_import_expression(self, expr);
    }
}

fn source_type_for(path: &Path) -> SourceType {
    let ext = path.extension().and_then(|e| e.to_str());

    let mut st = SourceType::default()
        .with_jsx(matches!(ext, Some("tsx") | Some("jsx")))
        .with_typescript(matches!(ext, Some("ts") | Some("tsx") | Some("mts") | Some("cts")));

    if matches!(ext, Some("mjs") | Some("mts")) {
        st = st.with_module(true);
    }

    st
}
