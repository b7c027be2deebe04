//! Built-in documentation snippets
//!
//! Each snippet is registered as a named template so user templates can pull
//! it in with `{% include "chart.valuesSection" %}`. Snippets carry no
//! trailing newline; surrounding templates decide the spacing.

/// Name the built-in document is registered under
pub const DEFAULT_TEMPLATE_NAME: &str = "chartdoc.default";

/// The document rendered when no template file is found
pub const DEFAULT_TEMPLATE: &str = r#"{% include "chart.header" %}

{% include "chart.deprecationWarning" %}

{% include "chart.badgesSection" %}

{% include "chart.description" %}

{% include "chart.homepageLine" %}

{% include "chart.maintainersSection" %}

{% include "chart.sourcesSection" %}

{% include "chart.requirementsSection" %}

{% include "chart.valuesSection" %}

{% include "chartdoc.versionFooter" %}
"#;

const VALUES_TABLE_HEAD: &str = "| Key | Type | Default | Description |\n|-----|------|---------|-------------|";

/// One table row; `row` is bound by the enclosing loop
const VALUES_TABLE_ROW: &str = "\n| {{ row.key | md_escape }} | {{ row.type }} | {{ row.default | md_escape }} | {{ (row.description or row.autoDescription) | md_escape }} |";

fn badge(label: &str, field: &str) -> String {
    format!(
        "{{% if chart.{field} %}}![{label}: {{{{ chart.{field} }}}}](https://img.shields.io/badge/{label}-{{{{ chart.{field} | badge_escape }}}}-informational?style=flat-square) {{% endif %}}"
    )
}

fn values_table(rows: &str) -> String {
    format!("{VALUES_TABLE_HEAD}{{% for row in {rows} %}}{VALUES_TABLE_ROW}{{% endfor %}}")
}

/// All named snippets, in registration order
pub fn snippets() -> Vec<(&'static str, String)> {
    let fixed: &[(&'static str, &str)] = &[
        ("chart.header", "# {{ chart.name }}"),
        (
            "chart.deprecationWarning",
            "{% if chart.deprecated %}> **:exclamation: This Helm Chart is deprecated!**{% endif %}",
        ),
        ("chart.description", "{{ chart.description or \"\" }}"),
        ("chart.version", "{{ chart.version }}"),
        ("chart.type", "{{ chart.type or \"\" }}"),
        ("chart.appVersion", "{{ chart.appVersion or \"\" }}"),
        (
            "chart.badgesSection",
            "{% include \"chart.versionBadge\" %}{% include \"chart.typeBadge\" %}{% include \"chart.appVersionBadge\" %}",
        ),
        ("chart.homepage", "{{ chart.home or \"\" }}"),
        (
            "chart.homepageLine",
            "{% if chart.home %}**Homepage:** <{{ chart.home }}>{% endif %}",
        ),
        ("chart.kubeVersion", "{{ chart.kubeVersion or \"\" }}"),
        (
            "chart.kubeVersionLine",
            "{% if chart.kubeVersion %}Kubernetes: `{{ chart.kubeVersion }}`{% endif %}",
        ),
        ("chart.maintainersHeader", "## Maintainers"),
        (
            "chart.maintainersTable",
            "| Name | Email | Url |\n| ---- | ------ | --- |{% for maintainer in chart.maintainers %}\n| {{ maintainer.name }} | {% if maintainer.email %}<{{ maintainer.email }}>{% endif %} | {% if maintainer.url %}<{{ maintainer.url }}>{% endif %} |{% endfor %}",
        ),
        (
            "chart.maintainersSection",
            "{% if chart.maintainers %}{% include \"chart.maintainersHeader\" %}\n\n{% include \"chart.maintainersTable\" %}{% endif %}",
        ),
        ("chart.sourcesHeader", "## Source Code"),
        (
            "chart.sourcesList",
            "{% for source in chart.sources %}{% if not loop.first %}\n{% endif %}* <{{ source }}>{% endfor %}",
        ),
        (
            "chart.sourcesSection",
            "{% if chart.sources %}{% include \"chart.sourcesHeader\" %}\n\n{% include \"chart.sourcesList\" %}{% endif %}",
        ),
        ("chart.requirementsHeader", "## Requirements"),
        (
            "chart.requirementsTable",
            "| Repository | Name | Version |\n|------------|------|---------|{% for dep in chart.dependencies %}\n| {{ dep.repository }} | {% if dep.alias %}{{ dep.name }}({{ dep.alias }}){% else %}{{ dep.name }}{% endif %} | {{ dep.version }} |{% endfor %}",
        ),
        (
            "chart.requirementsSection",
            "{% if chart.dependencies or chart.kubeVersion %}{% include \"chart.requirementsHeader\" %}\n\n{% if chart.kubeVersion %}{% include \"chart.kubeVersionLine\" %}{% if chart.dependencies %}\n\n{% endif %}{% endif %}{% if chart.dependencies %}{% include \"chart.requirementsTable\" %}{% endif %}{% endif %}",
        ),
        ("chart.valuesHeader", "## Values"),
        (
            "chart.valuesSection",
            "{% if values %}{% include \"chart.valuesHeader\" %}\n\n{% include \"chart.valuesTable\" %}{% endif %}",
        ),
        (
            "chartdoc.versionFooter",
            "Autogenerated from chart metadata using {{ generator.name }}{% if generator.version %} v{{ generator.version }}{% endif %}",
        ),
    ];

    let mut all: Vec<(&'static str, String)> = fixed
        .iter()
        .map(|(name, source)| (*name, (*source).to_string()))
        .collect();

    all.push(("chart.versionBadge", badge("Version", "version")));
    all.push(("chart.typeBadge", badge("Type", "type")));
    all.push(("chart.appVersionBadge", badge("AppVersion", "appVersion")));
    all.push(("chart.valuesTable", values_table("values")));
    all.push((
        "chart.valuesSectionsTables",
        format!(
            "{{% for section in sections.sections %}}### {{{{ section.name }}}}\n\n{table}\n\n{{% endfor %}}{{% if sections.unsectioned %}}### Other Values\n\n{other}{{% endif %}}",
            table = values_table("section.rows"),
            other = values_table("sections.unsectioned"),
        ),
    ));

    all
}

/// Names of every built-in template, used for include suggestions
pub fn snippet_names() -> Vec<&'static str> {
    let mut names: Vec<&'static str> = snippets().into_iter().map(|(name, _)| name).collect();
    names.push(DEFAULT_TEMPLATE_NAME);
    names
}
