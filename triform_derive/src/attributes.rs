use syn::{DeriveInput, Error, Field, LitStr};

pub struct ContainerAttributes {
    pub tag: Option<LitStr>,
    pub init: bool,
}

pub fn parse_container_attributes(input: &DeriveInput) -> Result<ContainerAttributes, Error> {
    let mut attributes = ContainerAttributes {
        tag: None,
        init: false,
    };
    for attr in &input.attrs {
        if !attr.path().is_ident("reflect") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("tag") {
                if attributes.tag.is_some() {
                    return Err(meta.error("duplicate tag argument"));
                }
                attributes.tag = Some(meta.value()?.parse()?);
                Ok(())
            } else if meta.path.is_ident("init") {
                attributes.init = true;
                Ok(())
            } else {
                Err(meta.error("expected `tag = \"...\"` or `init`"))
            }
        })?;
    }
    Ok(attributes)
}

pub struct FieldAttributes {
    pub flatten: bool,
    pub skip: bool,
    pub omit_bounds: bool,
}

pub fn parse_field_attributes(field: &Field) -> Result<FieldAttributes, Error> {
    let mut attributes = FieldAttributes {
        flatten: false,
        skip: false,
        omit_bounds: false,
    };
    for attr in &field.attrs {
        if !attr.path().is_ident("reflect") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("flatten") {
                attributes.flatten = true;
                Ok(())
            } else if meta.path.is_ident("skip") {
                attributes.skip = true;
                Ok(())
            } else if meta.path.is_ident("omit_bounds") {
                attributes.omit_bounds = true;
                Ok(())
            } else {
                Err(meta.error("expected `flatten`, `skip`, or `omit_bounds`"))
            }
        })?;
    }
    if attributes.flatten && attributes.skip {
        return Err(Error::new_spanned(
            field,
            "`flatten` and `skip` are mutually exclusive",
        ));
    }
    Ok(attributes)
}
