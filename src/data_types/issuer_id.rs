impl_object_id!(IssuerId, "An opaque issuer identifier");
